use crate::validator::FieldErrors;

/// Domain-level failures, independent of transport.
///
/// The HTTP layer maps each variant onto a status code; nothing here knows
/// about HTTP.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("the requested resource could not be found")]
    NotFound,

    /// One message per offending field (first error per field wins).
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("unable to update the record due to an edit conflict, please try again")]
    EditConflict,

    /// No credential was presented on a route that needs one.
    #[error("you must be authenticated to access this resource")]
    AuthenticationRequired,

    /// The caller is known but has not activated their account.
    #[error("your user account must be activated to access this resource")]
    InactiveAccount,

    /// A credential was presented but is malformed, unknown, or expired.
    #[error("invalid or missing authentication token")]
    InvalidAuthenticationToken,

    #[error("invalid authentication credentials")]
    InvalidCredentials,

    /// Identity is known but lacks the required permission code.
    #[error("your user account doesn't have the necessary permissions to access this resource")]
    NotPermitted,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Build a validation error carrying a single field message.
    pub fn field(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), message.to_string());
        CoreError::Validation(errors)
    }
}
