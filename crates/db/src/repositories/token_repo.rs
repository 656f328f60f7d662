//! Repository for the `tokens` table.

use async_trait::async_trait;
use episodic_core::tokens::Scope;
use episodic_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::accounts::TokenStore;
use crate::deadline::with_deadline;
use crate::error::DbResult;
use crate::models::token::Token;
use crate::models::user::User;

pub struct TokenRepo {
    pool: PgPool,
}

impl TokenRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for TokenRepo {
    async fn insert(&self, token: &Token) -> DbResult<()> {
        with_deadline(
            sqlx::query(
                "INSERT INTO tokens (hash, user_id, expiry, scope)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(&token.hash)
            .bind(token.user_id)
            .bind(token.expiry)
            .bind(token.scope.as_str())
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    /// Expiry is checked in the same statement as the lookup.
    async fn find_user(&self, hash: &str, scope: Scope, now: Timestamp) -> DbResult<Option<User>> {
        with_deadline(
            sqlx::query_as::<_, User>(
                "SELECT users.id, users.created_at, users.name, users.email,
                        users.password_hash, users.activated, users.version
                 FROM users
                 INNER JOIN tokens ON users.id = tokens.user_id
                 WHERE tokens.hash = $1
                 AND tokens.scope = $2
                 AND tokens.expiry > $3",
            )
            .bind(hash)
            .bind(scope.as_str())
            .bind(now)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn delete_all_for_user(&self, user_id: DbId, scope: Scope) -> DbResult<()> {
        let result = with_deadline(
            sqlx::query("DELETE FROM tokens WHERE scope = $1 AND user_id = $2")
                .bind(scope.as_str())
                .bind(user_id)
                .execute(&self.pool),
        )
        .await?;
        tracing::debug!(user_id, %scope, revoked = result.rows_affected(), "Tokens revoked");
        Ok(())
    }
}
