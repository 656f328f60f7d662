//! Persistence layer.
//!
//! Every store is exposed as an async capability trait (see [`resource`] and
//! [`accounts`]) with two implementations: PostgreSQL repositories in
//! [`repositories`] and in-process maps in [`memory`]. [`Stores`] bundles one
//! of each behind `Arc<dyn ...>` so the HTTP layer never names a backend.

use sqlx::postgres::PgPoolOptions;

pub mod accounts;
pub mod deadline;
pub mod error;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod resource;
pub mod stores;

pub use error::{DbError, DbResult};
pub use stores::Stores;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Round-trip a trivial statement to prove the pool can reach the server.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations in `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
