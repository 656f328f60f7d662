//! PostgreSQL implementations of the store traits.
//!
//! Every statement runs under [`with_deadline`](crate::deadline::with_deadline).

pub mod character_repo;
pub mod comment_repo;
pub mod episode_repo;
pub mod permission_repo;
pub mod token_repo;
pub mod user_repo;

pub use character_repo::CharacterRepo;
pub use comment_repo::CommentRepo;
pub use episode_repo::EpisodeRepo;
pub use permission_repo::PermissionRepo;
pub use token_repo::TokenRepo;
pub use user_repo::UserRepo;

use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use crate::error::DbError;

/// Split `count(*) OVER() AS total_records` rows into records and the total.
///
/// An empty page yields a total of zero, including pages past the end.
fn collect_page<R>(rows: Vec<PgRow>) -> Result<(Vec<R>, i64), sqlx::Error>
where
    R: for<'r> FromRow<'r, PgRow>,
{
    let mut total = 0;
    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        total = row.try_get::<i64, _>("total_records")?;
        records.push(R::from_row(row)?);
    }
    Ok((records, total))
}

/// Rewrite a foreign key violation into [`DbError::MissingReference`].
fn foreign_key_to(field: &'static str) -> impl FnOnce(DbError) -> DbError {
    move |err| match err {
        DbError::Sqlx(sqlx::Error::Database(ref db)) if db.is_foreign_key_violation() => {
            DbError::MissingReference(field)
        }
        other => other,
    }
}
