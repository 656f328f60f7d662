//! Time-boxing for store statements.

use std::future::Future;
use std::time::Duration;

use crate::error::{DbError, DbResult};

/// Upper bound on any single statement.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Run `fut` under [`QUERY_TIMEOUT`].
///
/// On expiry the future is dropped (which cancels the in-flight statement)
/// and [`DbError::Timeout`] is returned.
pub async fn with_deadline<T, E, F>(fut: F) -> DbResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<DbError>,
{
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            tracing::warn!(timeout = ?QUERY_TIMEOUT, "Store statement timed out");
            Err(DbError::Timeout(QUERY_TIMEOUT))
        }
    }
}
