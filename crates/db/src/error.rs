use std::time::Duration;

/// Failures surfaced by any store implementation.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// No row matched, or the id was outside the valid range.
    #[error("record not found")]
    NotFound,

    /// A version-checked update matched zero rows.
    #[error("edit conflict")]
    EditConflict,

    #[error("duplicate email")]
    DuplicateEmail,

    /// A foreign key named a row that does not exist. Carries the field.
    #[error("referenced {0} does not exist")]
    MissingReference(&'static str),

    /// The statement did not finish before its deadline and was abandoned.
    #[error("statement exceeded its {0:?} deadline")]
    Timeout(Duration),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type DbResult<T> = Result<T, DbError>;
