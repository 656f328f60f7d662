//! Repository for the `comments` table.

use async_trait::async_trait;
use episodic_core::filters::Filters;
use episodic_core::types::DbId;
use sqlx::PgPool;

use super::{collect_page, foreign_key_to};
use crate::deadline::with_deadline;
use crate::error::DbResult;
use crate::models::comment::{Comment, CommentFilter, NewComment};
use crate::resource::ResourceStore;

const COLUMNS: &str = "id, user_id, episode_id, comment_text, like_count, created_at, version";

pub struct CommentRepo {
    pool: PgPool,
}

impl CommentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResourceStore<Comment> for CommentRepo {
    async fn insert(&self, input: &NewComment) -> DbResult<Comment> {
        let query = format!(
            "INSERT INTO comments (user_id, episode_id, comment_text, like_count)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        with_deadline(
            sqlx::query_as::<_, Comment>(&query)
                .bind(input.user_id)
                .bind(input.episode_id)
                .bind(&input.comment_text)
                .bind(input.like_count)
                .fetch_one(&self.pool),
        )
        .await
        .map_err(foreign_key_to("episode_id"))
    }

    async fn find_by_id(&self, id: DbId) -> DbResult<Option<Comment>> {
        let query = format!("SELECT {COLUMNS} FROM comments WHERE id = $1");
        with_deadline(
            sqlx::query_as::<_, Comment>(&query)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn update_if_version(&self, comment: &Comment) -> DbResult<Option<i32>> {
        with_deadline(
            sqlx::query_scalar::<_, i32>(
                "UPDATE comments
                 SET comment_text = $1, like_count = $2, version = version + 1
                 WHERE id = $3 AND version = $4
                 RETURNING version",
            )
            .bind(&comment.comment_text)
            .bind(comment.like_count)
            .bind(comment.id)
            .bind(comment.version)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn delete_by_id(&self, id: DbId) -> DbResult<bool> {
        let result = with_deadline(
            sqlx::query("DELETE FROM comments WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_page(
        &self,
        filter: &CommentFilter,
        filters: &Filters,
    ) -> DbResult<(Vec<Comment>, i64)> {
        let query = format!(
            "SELECT count(*) OVER() AS total_records, {COLUMNS}
             FROM comments
             WHERE (to_tsvector('simple', comment_text) @@ plainto_tsquery('simple', $1) OR $1 = '')
             AND ($2::bigint IS NULL OR episode_id = $2)
             ORDER BY {} {}, id ASC
             LIMIT $3 OFFSET $4",
            filters.sort_column(),
            filters.sort_direction().as_sql(),
        );
        let rows = with_deadline(
            sqlx::query(&query)
                .bind(&filter.comment_text)
                .bind(filter.episode_id)
                .bind(filters.limit())
                .bind(filters.offset())
                .fetch_all(&self.pool),
        )
        .await?;
        Ok(collect_page(rows)?)
    }
}
