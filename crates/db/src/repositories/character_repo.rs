//! Repository for the `characters` table.

use async_trait::async_trait;
use episodic_core::filters::Filters;
use episodic_core::types::DbId;
use sqlx::PgPool;

use super::{collect_page, foreign_key_to};
use crate::deadline::with_deadline;
use crate::error::DbResult;
use crate::models::character::{Character, CharacterFilter, NewCharacter};
use crate::resource::ResourceStore;

const COLUMNS: &str = "id, episode_id, name, age, version";

pub struct CharacterRepo {
    pool: PgPool,
}

impl CharacterRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResourceStore<Character> for CharacterRepo {
    /// Fails with `MissingReference("episode_id")` if the episode is gone.
    async fn insert(&self, input: &NewCharacter) -> DbResult<Character> {
        let query = format!(
            "INSERT INTO characters (episode_id, name, age)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        with_deadline(
            sqlx::query_as::<_, Character>(&query)
                .bind(input.episode_id)
                .bind(&input.name)
                .bind(input.age.unwrap_or_default())
                .fetch_one(&self.pool),
        )
        .await
        .map_err(foreign_key_to("episode_id"))
    }

    async fn find_by_id(&self, id: DbId) -> DbResult<Option<Character>> {
        let query = format!("SELECT {COLUMNS} FROM characters WHERE id = $1");
        with_deadline(
            sqlx::query_as::<_, Character>(&query)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn update_if_version(&self, character: &Character) -> DbResult<Option<i32>> {
        with_deadline(
            sqlx::query_scalar::<_, i32>(
                "UPDATE characters
                 SET name = $1, age = $2, version = version + 1
                 WHERE id = $3 AND version = $4
                 RETURNING version",
            )
            .bind(&character.name)
            .bind(character.age)
            .bind(character.id)
            .bind(character.version)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn delete_by_id(&self, id: DbId) -> DbResult<bool> {
        let result = with_deadline(
            sqlx::query("DELETE FROM characters WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_page(
        &self,
        filter: &CharacterFilter,
        filters: &Filters,
    ) -> DbResult<(Vec<Character>, i64)> {
        let query = format!(
            "SELECT count(*) OVER() AS total_records, {COLUMNS}
             FROM characters
             WHERE (to_tsvector('simple', name) @@ plainto_tsquery('simple', $1) OR $1 = '')
             AND ($2::bigint IS NULL OR episode_id = $2)
             ORDER BY {} {}, id ASC
             LIMIT $3 OFFSET $4",
            filters.sort_column(),
            filters.sort_direction().as_sql(),
        );
        let rows = with_deadline(
            sqlx::query(&query)
                .bind(&filter.name)
                .bind(filter.episode_id)
                .bind(filters.limit())
                .bind(filters.offset())
                .fetch_all(&self.pool),
        )
        .await?;
        Ok(collect_page(rows)?)
    }
}
