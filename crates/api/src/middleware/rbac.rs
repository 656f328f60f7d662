//! Permission-gate extractors.
//!
//! Each extractor builds on the [`CurrentUser`] resolved by the
//! authentication middleware and rejects requests that do not meet its
//! requirement. Use these in route handlers to enforce authorization at the
//! type level.

use std::marker::PhantomData;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use episodic_core::error::CoreError;
use episodic_core::permissions::{EPISODES_READ, EPISODES_WRITE};
use episodic_db::models::user::User;

use super::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires a non-anonymous caller. Rejects with 401 otherwise.
///
/// ```ignore
/// async fn handler(RequireAuthenticated(user): RequireAuthenticated) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAuthenticated(pub User);

impl<S: Send + Sync> FromRequestParts<S> for RequireAuthenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await? {
            CurrentUser::Authenticated(user) => Ok(RequireAuthenticated(user)),
            CurrentUser::Anonymous => Err(AppError::Core(CoreError::AuthenticationRequired)),
        }
    }
}

/// Requires an authenticated caller whose account is activated.
pub struct RequireActivated(pub User);

impl<S: Send + Sync> FromRequestParts<S> for RequireActivated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuthenticated(user) =
            RequireAuthenticated::from_request_parts(parts, state).await?;
        if !user.activated {
            return Err(AppError::Core(CoreError::InactiveAccount));
        }
        Ok(RequireActivated(user))
    }
}

/// A permission code checked by [`RequirePermission`].
pub trait PermissionCode: Send + Sync + 'static {
    const CODE: &'static str;
}

/// `episodes:read`, held by every registered user.
pub struct EpisodesRead;

impl PermissionCode for EpisodesRead {
    const CODE: &'static str = EPISODES_READ;
}

/// `episodes:write`
pub struct EpisodesWrite;

impl PermissionCode for EpisodesWrite {
    const CODE: &'static str = EPISODES_WRITE;
}

/// Requires an activated caller holding permission `P`.
///
/// Anonymous or inactive callers get 401; a known caller lacking the code
/// gets 403.
///
/// ```ignore
/// async fn writer(RequirePermission(user, _): RequirePermission<EpisodesWrite>) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequirePermission<P>(pub User, pub PhantomData<fn() -> P>);

impl<P: PermissionCode> FromRequestParts<AppState> for RequirePermission<P> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireActivated(user) = RequireActivated::from_request_parts(parts, state).await?;

        let allowed = state
            .stores
            .permissions
            .has_permission(user.id, P::CODE)
            .await?;
        if !allowed {
            tracing::debug!(user_id = user.id, permission = P::CODE, "Permission denied");
            return Err(AppError::Core(CoreError::NotPermitted));
        }

        Ok(RequirePermission(user, PhantomData))
    }
}
