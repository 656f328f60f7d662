//! Request handlers.
//!
//! [`resource`] holds the CRUD handlers shared by every version-stamped
//! resource; the per-resource modules bind a type to its store and filter.
//! Handlers delegate to the stores in [`episodic_db::Stores`] and map errors
//! via [`AppError`].

use axum::http::StatusCode;
use axum::Json;
use episodic_core::error::CoreError;
use serde_json::{json, Value};

use crate::error::AppError;

pub mod character;
pub mod comment;
pub mod episode;
pub mod resource;
pub mod token;
pub mod user;

/// Fallback for unmatched paths.
pub async fn not_found() -> AppError {
    AppError::Core(CoreError::NotFound)
}

/// Fallback for a known path with an unsupported method.
pub async fn method_not_allowed() -> (StatusCode, Json<Value>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": "the requested method is not supported for this resource",
            "code": "METHOD_NOT_ALLOWED",
        })),
    )
}
