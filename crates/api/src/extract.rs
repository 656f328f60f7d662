//! Request extractors that reject with [`AppError`].

use axum::extract::{FromRequest, FromRequestParts, Path};
use axum::http::request::Parts;
use episodic_core::error::CoreError;
use episodic_core::types::DbId;

use crate::error::AppError;

/// `axum::Json` whose rejection is an [`AppError`] (400 with a JSON body).
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// The `{id}` path segment as a positive integer.
///
/// Anything else (non-numeric, zero, negative) is a 404.
#[derive(Debug, Clone, Copy)]
pub struct ResourceId(pub DbId);

impl<S: Send + Sync> FromRequestParts<S> for ResourceId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Core(CoreError::NotFound))?;

        match raw.parse::<DbId>() {
            Ok(id) if id > 0 => Ok(ResourceId(id)),
            _ => Err(AppError::Core(CoreError::NotFound)),
        }
    }
}
