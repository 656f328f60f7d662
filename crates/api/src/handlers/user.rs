//! Handlers for `/users`: registration and account activation.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use episodic_core::error::CoreError;
use episodic_core::permissions::EPISODES_READ;
use episodic_core::tokens::{hash_token, Scope, TOKEN_LENGTH};
use episodic_core::validator::Validator;
use episodic_db::models::token::Token;
use episodic_db::models::user::{
    validate_email, validate_name, validate_password_plaintext, NewUser, User,
};
use episodic_db::DbError;
use serde::{Deserialize, Serialize};

use crate::auth::password::hash_password;
use crate::error::AppResult;
use crate::extract::AppJson;
use crate::response::Envelope;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/users`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Registration result. This is the only response that ever carries the
/// activation token plaintext.
#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub user: User,
    pub activation_token: Token,
}

/// Request body for `PUT /v1/users/activated`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActivateRequest {
    pub token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/users
///
/// Creates an inactive account holding `episodes:read` and issues an
/// activation token. If the grant or the token cannot be stored, the account
/// is deleted again so the address can register afresh.
pub async fn register(
    State(state): State<AppState>,
    AppJson(input): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegistrationResponse>)> {
    let email = input.email.trim().to_lowercase();

    let mut v = Validator::new();
    validate_name(&mut v, &input.name);
    validate_email(&mut v, &email);
    validate_password_plaintext(&mut v, &input.password);
    v.into_result()?;

    let password_hash = hash_password(&input.password)?;
    let user = state
        .stores
        .users
        .insert(&NewUser {
            name: input.name,
            email,
            password_hash,
        })
        .await?;

    let provisioned = async {
        state
            .stores
            .permissions
            .add_for_user(user.id, &[EPISODES_READ])
            .await?;
        state
            .stores
            .tokens
            .new_token(user.id, state.config.tokens.activation_ttl, Scope::Activation)
            .await
    }
    .await;

    let activation_token = match provisioned {
        Ok(token) => token,
        Err(err) => {
            if let Err(cleanup) = state.stores.users.delete_by_id(user.id).await {
                tracing::error!(user_id = user.id, error = %cleanup, "Failed to remove half-registered user");
            }
            return Err(err.into());
        }
    };

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::ACCEPTED,
        Json(RegistrationResponse {
            user,
            activation_token,
        }),
    ))
}

/// PUT /v1/users/activated
///
/// Consumes an activation token. Every outstanding activation token for the
/// user is deleted afterwards.
pub async fn activate(
    State(state): State<AppState>,
    AppJson(input): AppJson<ActivateRequest>,
) -> AppResult<Json<Envelope<User>>> {
    let mut v = Validator::new();
    v.check(!input.token.is_empty(), "token", "must be provided");
    v.check(
        input.token.len() == TOKEN_LENGTH,
        "token",
        "must be 52 bytes long",
    );
    v.into_result()?;

    let mut user = match state
        .stores
        .tokens
        .get_user(&hash_token(&input.token), Scope::Activation)
        .await
    {
        Ok(user) => user,
        Err(DbError::NotFound) => {
            return Err(CoreError::field("token", "invalid or expired activation token").into())
        }
        Err(err) => return Err(err.into()),
    };

    user.activated = true;
    state.stores.users.update(&mut user).await?;

    state
        .stores
        .tokens
        .delete_all_for_user(user.id, Scope::Activation)
        .await?;

    tracing::info!(user_id = user.id, "User activated");
    Ok(Json(Envelope::new("user", user)))
}
