//! Repository for `permissions` and the `users_permissions` join table.

use async_trait::async_trait;
use episodic_core::permissions::Permissions;
use episodic_core::types::DbId;
use sqlx::PgPool;

use crate::accounts::PermissionStore;
use crate::deadline::with_deadline;
use crate::error::DbResult;

pub struct PermissionRepo {
    pool: PgPool,
}

impl PermissionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionStore for PermissionRepo {
    async fn get_all_for_user(&self, user_id: DbId) -> DbResult<Permissions> {
        let codes = with_deadline(
            sqlx::query_scalar::<_, String>(
                "SELECT permissions.code
                 FROM permissions
                 INNER JOIN users_permissions ON users_permissions.permission_id = permissions.id
                 WHERE users_permissions.user_id = $1",
            )
            .bind(user_id)
            .fetch_all(&self.pool),
        )
        .await?;
        Ok(Permissions::from(codes))
    }

    async fn add_for_user(&self, user_id: DbId, codes: &[&str]) -> DbResult<()> {
        with_deadline(
            sqlx::query(
                "INSERT INTO users_permissions
                 SELECT $1, permissions.id FROM permissions WHERE permissions.code = ANY($2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(codes)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}
