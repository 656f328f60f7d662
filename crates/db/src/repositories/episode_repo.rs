//! Repository for the `episodes` table.

use async_trait::async_trait;
use episodic_core::filters::Filters;
use episodic_core::types::DbId;
use sqlx::PgPool;

use super::collect_page;
use crate::deadline::with_deadline;
use crate::error::DbResult;
use crate::models::episode::{Episode, EpisodeFilter, NewEpisode};
use crate::resource::ResourceStore;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, created_at, title, year, runtime, characters, version";

pub struct EpisodeRepo {
    pool: PgPool,
}

impl EpisodeRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResourceStore<Episode> for EpisodeRepo {
    async fn insert(&self, input: &NewEpisode) -> DbResult<Episode> {
        let query = format!(
            "INSERT INTO episodes (title, year, runtime, characters)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        with_deadline(
            sqlx::query_as::<_, Episode>(&query)
                .bind(&input.title)
                .bind(input.year)
                .bind(input.runtime)
                .bind(input.characters.as_deref().unwrap_or_default())
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn find_by_id(&self, id: DbId) -> DbResult<Option<Episode>> {
        let query = format!("SELECT {COLUMNS} FROM episodes WHERE id = $1");
        with_deadline(
            sqlx::query_as::<_, Episode>(&query)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn update_if_version(&self, episode: &Episode) -> DbResult<Option<i32>> {
        with_deadline(
            sqlx::query_scalar::<_, i32>(
                "UPDATE episodes
                 SET title = $1, year = $2, runtime = $3, characters = $4, version = version + 1
                 WHERE id = $5 AND version = $6
                 RETURNING version",
            )
            .bind(&episode.title)
            .bind(episode.year)
            .bind(episode.runtime)
            .bind(&episode.characters)
            .bind(episode.id)
            .bind(episode.version)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn delete_by_id(&self, id: DbId) -> DbResult<bool> {
        let result = with_deadline(
            sqlx::query("DELETE FROM episodes WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_page(
        &self,
        filter: &EpisodeFilter,
        filters: &Filters,
    ) -> DbResult<(Vec<Episode>, i64)> {
        let query = format!(
            "SELECT count(*) OVER() AS total_records, {COLUMNS}
             FROM episodes
             WHERE (to_tsvector('simple', title) @@ plainto_tsquery('simple', $1) OR $1 = '')
             AND (characters @> $2 OR $2 = '{{}}')
             ORDER BY {} {}, id ASC
             LIMIT $3 OFFSET $4",
            filters.sort_column(),
            filters.sort_direction().as_sql(),
        );
        let rows = with_deadline(
            sqlx::query(&query)
                .bind(&filter.title)
                .bind(&filter.characters)
                .bind(filters.limit())
                .bind(filters.offset())
                .fetch_all(&self.pool),
        )
        .await?;
        Ok(collect_page(rows)?)
    }
}
