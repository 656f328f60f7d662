//! Bearer-token authentication.
//!
//! [`authenticate`] runs on every request and stores a [`CurrentUser`] in the
//! request extensions. Handlers and the [`rbac`](super::rbac) extractors read
//! it back; nothing is looked up ambiently.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::VARY;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use episodic_core::error::CoreError;
use episodic_core::tokens::{hash_token, Scope};
use episodic_db::models::user::User;
use episodic_db::DbError;

use crate::auth::tokens::{bearer_credential, BearerCredential};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// The identity a request runs as.
#[derive(Debug, Clone)]
pub enum CurrentUser {
    /// No `Authorization` header. Never persisted, holds no permissions.
    Anonymous,
    Authenticated(User),
}

impl CurrentUser {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, CurrentUser::Anonymous)
    }
}

/// Resolve the caller and attach it to the request.
///
/// A malformed header or an unknown/expired token is rejected outright
/// rather than downgraded to anonymous. Every response leaving this layer
/// carries `Vary: Authorization`.
pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let resolved = resolve(&state, req.headers()).await;
    let mut response = match resolved {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    };

    response
        .headers_mut()
        .append(VARY, HeaderValue::from_static("Authorization"));
    response
}

async fn resolve(state: &AppState, headers: &HeaderMap) -> AppResult<CurrentUser> {
    let token = match bearer_credential(headers) {
        BearerCredential::Absent => return Ok(CurrentUser::Anonymous),
        BearerCredential::Malformed => {
            return Err(AppError::Core(CoreError::InvalidAuthenticationToken))
        }
        BearerCredential::Token(token) => token,
    };

    match state
        .stores
        .tokens
        .get_user(&hash_token(token), Scope::Authentication)
        .await
    {
        Ok(user) => Ok(CurrentUser::Authenticated(user)),
        Err(DbError::NotFound) => Err(AppError::Core(CoreError::InvalidAuthenticationToken)),
        Err(err) => Err(err.into()),
    }
}

/// Reads the identity set by [`authenticate`]. Without that layer every
/// request is anonymous.
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .unwrap_or(CurrentUser::Anonymous))
    }
}
