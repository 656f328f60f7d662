//! Scoped bearer token record.

use chrono::Utc;
use episodic_core::tokens::{generate_token, Scope};
use episodic_core::types::{DbId, Timestamp};
use serde::Serialize;

/// A token as issued to a client.
///
/// Serializes as `{"token": ..., "expiry": ...}`. The hash, owner, and scope
/// stay server-side.
#[derive(Debug, Clone, Serialize)]
pub struct Token {
    #[serde(rename = "token")]
    pub plaintext: String,
    #[serde(skip)]
    pub hash: String,
    #[serde(skip)]
    pub user_id: DbId,
    pub expiry: Timestamp,
    #[serde(skip)]
    pub scope: Scope,
}

impl Token {
    pub fn generate(user_id: DbId, ttl: chrono::Duration, scope: Scope) -> Self {
        let generated = generate_token();
        Self {
            plaintext: generated.plaintext,
            hash: generated.hash,
            user_id,
            expiry: Utc::now() + ttl,
            scope,
        }
    }
}
