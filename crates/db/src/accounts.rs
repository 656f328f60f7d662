//! Store contracts for users, scoped tokens, and permission codes.

use async_trait::async_trait;
use chrono::Utc;
use episodic_core::permissions::Permissions;
use episodic_core::tokens::Scope;
use episodic_core::types::{DbId, Timestamp};

use crate::error::{DbError, DbResult};
use crate::models::token::Token;
use crate::models::user::{NewUser, User};
use crate::resource::apply_versioned_outcome;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`DbError::DuplicateEmail`] when the address is taken.
    async fn insert(&self, user: &NewUser) -> DbResult<User>;

    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>>;

    /// Returns the new version, or `None` when no row matched.
    async fn update_if_version(&self, user: &User) -> DbResult<Option<i32>>;

    /// Remove the account. Its tokens and permission grants go with it.
    async fn delete_by_id(&self, id: DbId) -> DbResult<bool>;

    async fn get_by_email(&self, email: &str) -> DbResult<User> {
        self.find_by_email(email).await?.ok_or(DbError::NotFound)
    }

    async fn update(&self, user: &mut User) -> DbResult<()> {
        let outcome = self.update_if_version(user).await?;
        apply_versioned_outcome(user, outcome)
    }
}

/// Persistence for hashed, scoped, expiring tokens.
///
/// Only hashes reach this trait. Expiry is enforced inside the lookup
/// itself, so a token that has lapsed is indistinguishable from one that
/// never existed.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(&self, token: &Token) -> DbResult<()>;

    /// The owner of a token with this hash and scope that expires after `now`.
    async fn find_user(&self, hash: &str, scope: Scope, now: Timestamp) -> DbResult<Option<User>>;

    async fn delete_all_for_user(&self, user_id: DbId, scope: Scope) -> DbResult<()>;

    /// Generate, persist, and return a token. The returned value is the only
    /// copy of the plaintext.
    async fn new_token(&self, user_id: DbId, ttl: chrono::Duration, scope: Scope) -> DbResult<Token> {
        let token = Token::generate(user_id, ttl, scope);
        self.insert(&token).await?;
        Ok(token)
    }

    async fn get_user(&self, hash: &str, scope: Scope) -> DbResult<User> {
        self.find_user(hash, scope, Utc::now())
            .await?
            .ok_or(DbError::NotFound)
    }
}

#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn get_all_for_user(&self, user_id: DbId) -> DbResult<Permissions>;

    /// Grant the given codes. Codes that are not defined are ignored.
    async fn add_for_user(&self, user_id: DbId, codes: &[&str]) -> DbResult<()>;

    async fn has_permission(&self, user_id: DbId, code: &str) -> DbResult<bool> {
        Ok(self.get_all_for_user(user_id).await?.includes(code))
    }
}
