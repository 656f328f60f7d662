use axum::extract::rejection::JsonRejection;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use episodic_core::error::CoreError;
use episodic_db::DbError;
use serde_json::{json, Value};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`DbError`] for store failures,
/// and adds HTTP-specific variants. Implements [`IntoResponse`] to produce
/// consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `episodic_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A store error from `episodic_db`.
    #[error(transparent)]
    Db(#[from] DbError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "the server encountered a problem and could not process your request";

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => classify_core_error(core),

            // --- Store errors ---
            AppError::Db(err) => classify_db_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", json!(msg)),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": error,
            "code": code,
        });

        let mut response = (status, axum::Json(body)).into_response();
        if matches!(self, AppError::Core(CoreError::InvalidAuthenticationToken)) {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

fn internal() -> (StatusCode, &'static str, Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        json!(INTERNAL_MESSAGE),
    )
}

fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, Value) {
    let message = json!(err.to_string());
    match err {
        CoreError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", message),
        CoreError::Validation(fields) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_ERROR",
            json!(fields),
        ),
        CoreError::EditConflict => (StatusCode::CONFLICT, "EDIT_CONFLICT", message),
        CoreError::AuthenticationRequired
        | CoreError::InactiveAccount
        | CoreError::InvalidAuthenticationToken
        | CoreError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message),
        CoreError::NotPermitted => (StatusCode::FORBIDDEN, "FORBIDDEN", message),
        CoreError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", message),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

/// Classify a store error into an HTTP status, error code, and body.
///
/// Store details never reach the client; anything unexpected is logged and
/// answered with a generic 500.
fn classify_db_error(err: &DbError) -> (StatusCode, &'static str, Value) {
    match err {
        DbError::NotFound => classify_core_error(&CoreError::NotFound),
        DbError::EditConflict => classify_core_error(&CoreError::EditConflict),
        DbError::DuplicateEmail => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_ERROR",
            json!({ "email": "a user with this email address already exists" }),
        ),
        DbError::MissingReference(field) => {
            let mut fields = serde_json::Map::new();
            fields.insert(field.to_string(), json!("must reference an existing record"));
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                Value::Object(fields),
            )
        }
        DbError::Timeout(limit) => {
            tracing::error!(timeout = ?limit, "Store deadline exceeded");
            internal()
        }
        DbError::Sqlx(sqlx::Error::RowNotFound) => classify_core_error(&CoreError::NotFound),
        DbError::Sqlx(other) => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
