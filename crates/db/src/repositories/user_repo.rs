//! Repository for the `users` table.

use async_trait::async_trait;
use episodic_core::types::DbId;
use sqlx::PgPool;

use crate::accounts::UserStore;
use crate::deadline::with_deadline;
use crate::error::{DbError, DbResult};
use crate::models::user::{NewUser, User};

const COLUMNS: &str = "id, created_at, name, email, password_hash, activated, version";

/// The only unique constraint on `users` besides the key is the email.
fn duplicate_email(err: DbError) -> DbError {
    match err {
        DbError::Sqlx(sqlx::Error::Database(ref db)) if db.is_unique_violation() => {
            DbError::DuplicateEmail
        }
        other => other,
    }
}

pub struct UserRepo {
    pool: PgPool,
}

impl UserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepo {
    async fn insert(&self, input: &NewUser) -> DbResult<User> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, activated)
             VALUES ($1, $2, $3, false)
             RETURNING {COLUMNS}"
        );
        with_deadline(
            sqlx::query_as::<_, User>(&query)
                .bind(&input.name)
                .bind(&input.email)
                .bind(&input.password_hash)
                .fetch_one(&self.pool),
        )
        .await
        .map_err(duplicate_email)
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        with_deadline(
            sqlx::query_as::<_, User>(&query)
                .bind(email)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn update_if_version(&self, user: &User) -> DbResult<Option<i32>> {
        with_deadline(
            sqlx::query_scalar::<_, i32>(
                "UPDATE users
                 SET name = $1, email = $2, password_hash = $3, activated = $4,
                     version = version + 1
                 WHERE id = $5 AND version = $6
                 RETURNING version",
            )
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.activated)
            .bind(user.id)
            .bind(user.version)
            .fetch_optional(&self.pool),
        )
        .await
        .map_err(duplicate_email)
    }

    async fn delete_by_id(&self, id: DbId) -> DbResult<bool> {
        let result = with_deadline(
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
