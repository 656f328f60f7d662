//! User account model, DTOs, and field validation.

use episodic_core::types::{DbId, Timestamp};
use episodic_core::validator::{is_email, Validator};
use serde::Serialize;
use sqlx::FromRow;

use crate::resource::Versioned;

/// Minimum password length in bytes.
pub const MIN_PASSWORD_LEN: usize = 8;
/// Maximum password length in bytes (argon2 inputs beyond this are refused).
pub const MAX_PASSWORD_LEN: usize = 72;

/// A row from the `users` table. Never serializes the password hash.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub created_at: Timestamp,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub activated: bool,
    #[serde(skip)]
    pub version: i32,
}

/// Insert payload. The password arrives here already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl Versioned for User {
    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }
}

pub fn validate_name(v: &mut Validator, name: &str) {
    v.check(!name.is_empty(), "name", "must be provided");
    v.check(name.len() <= 500, "name", "must not be more than 500 bytes long");
}

pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(is_email(email), "email", "must be a valid email address");
}

pub fn validate_password_plaintext(v: &mut Validator, password: &str) {
    v.check(!password.is_empty(), "password", "must be provided");
    v.check(
        password.len() >= MIN_PASSWORD_LEN,
        "password",
        "must be at least 8 bytes long",
    );
    v.check(
        password.len() <= MAX_PASSWORD_LEN,
        "password",
        "must not be more than 72 bytes long",
    );
}
