//! Handlers for `/tokens/authentication` (issue and revoke bearer tokens).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use episodic_core::error::CoreError;
use episodic_core::tokens::Scope;
use episodic_core::validator::Validator;
use episodic_db::models::token::Token;
use episodic_db::models::user::{validate_email, validate_password_plaintext};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::password::verify_password;
use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::rbac::RequireAuthenticated;
use crate::state::AppState;

/// Request body for `POST /v1/tokens/authentication`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthenticationTokenResponse {
    pub authentication_token: Token,
}

/// POST /v1/tokens/authentication
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn create_authentication_token(
    State(state): State<AppState>,
    AppJson(input): AppJson<CredentialsRequest>,
) -> AppResult<(StatusCode, Json<AuthenticationTokenResponse>)> {
    let email = input.email.trim().to_lowercase();

    let mut v = Validator::new();
    validate_email(&mut v, &email);
    validate_password_plaintext(&mut v, &input.password);
    v.into_result()?;

    let user = state
        .stores
        .users
        .find_by_email(&email)
        .await?
        .ok_or(CoreError::InvalidCredentials)?;

    if !verify_password(&input.password, &user.password_hash)? {
        tracing::debug!(user_id = user.id, "Password mismatch");
        return Err(CoreError::InvalidCredentials.into());
    }

    let authentication_token = state
        .stores
        .tokens
        .new_token(
            user.id,
            state.config.tokens.authentication_ttl,
            Scope::Authentication,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthenticationTokenResponse {
            authentication_token,
        }),
    ))
}

/// DELETE /v1/tokens/authentication
///
/// Revokes every authentication token of the caller, the presented one
/// included.
pub async fn revoke_authentication_tokens(
    State(state): State<AppState>,
    RequireAuthenticated(user): RequireAuthenticated,
) -> AppResult<Json<Value>> {
    state
        .stores
        .tokens
        .delete_all_for_user(user.id, Scope::Authentication)
        .await?;

    tracing::info!(user_id = user.id, "Authentication tokens revoked");
    Ok(Json(json!({ "message": "authentication tokens revoked" })))
}
