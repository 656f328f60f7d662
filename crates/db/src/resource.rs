//! The capability shared by every version-stamped resource.
//!
//! A resource row knows its identity, its version stamp, how to validate
//! itself, and which sort keys it accepts. [`ResourceStore`] is the store
//! contract over any such row; the optimistic-update and pagination logic
//! lives in its provided methods so no backend or handler re-derives it.

use async_trait::async_trait;
use episodic_core::filters::{calculate_metadata, Filters, Metadata};
use episodic_core::types::DbId;
use episodic_core::validator::Validator;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{DbError, DbResult};

/// A row carrying an optimistic-concurrency version stamp.
pub trait Versioned {
    fn version(&self) -> i32;
    fn set_version(&mut self, version: i32);
}

/// Field checks run against a [`Validator`].
pub trait Validate {
    fn validate(&self, v: &mut Validator);
}

/// A partial update decoded from a `PATCH` body.
pub trait Changeset<R>: DeserializeOwned + Send {
    /// The version the caller last observed, if they sent one.
    fn expected_version(&self) -> Option<i32>;

    /// Copy every provided field onto `record`.
    fn apply(self, record: &mut R);
}

pub trait Resource: Versioned + Validate + Clone + Serialize + Send + Sync + 'static {
    /// Singular name, used as the JSON envelope key.
    const ENTITY: &'static str;
    /// Plural name, used as the listing envelope key and URL segment.
    const COLLECTION: &'static str;
    /// Sort keys accepted by the collection listing, signed variants included.
    const SORT_SAFELIST: &'static [&'static str];

    type Draft: DeserializeOwned + Validate + Send + Sync;
    type Changes: Changeset<Self>;
    type Filter: Default + Send + Sync;

    fn id(&self) -> DbId;

    /// Stamp the authenticated caller onto a draft before it is stored.
    fn assign_author(_draft: &mut Self::Draft, _user_id: DbId) {}
}

/// Store contract for one resource type.
///
/// Implementors supply the raw statements; callers use the provided
/// methods, which enforce the id range check and the edit-conflict rule.
#[async_trait]
pub trait ResourceStore<R: Resource>: Send + Sync {
    /// Persist a new row with version 1.
    async fn insert(&self, draft: &R::Draft) -> DbResult<R>;

    async fn find_by_id(&self, id: DbId) -> DbResult<Option<R>>;

    /// Write `record` only if the stored row still has `record.version()`.
    ///
    /// Returns the new version, or `None` when no row matched.
    async fn update_if_version(&self, record: &R) -> DbResult<Option<i32>>;

    /// Returns `true` if a row was removed.
    async fn delete_by_id(&self, id: DbId) -> DbResult<bool>;

    /// One page of matching rows plus the total number of matches.
    async fn list_page(&self, filter: &R::Filter, filters: &Filters) -> DbResult<(Vec<R>, i64)>;

    async fn get(&self, id: DbId) -> DbResult<R> {
        if id < 1 {
            return Err(DbError::NotFound);
        }
        self.find_by_id(id).await?.ok_or(DbError::NotFound)
    }

    /// Version-checked update. On success `record` carries the new version.
    async fn update(&self, record: &mut R) -> DbResult<()> {
        let outcome = self.update_if_version(record).await?;
        apply_versioned_outcome(record, outcome)
    }

    async fn delete(&self, id: DbId) -> DbResult<()> {
        if id < 1 {
            return Err(DbError::NotFound);
        }
        if self.delete_by_id(id).await? {
            Ok(())
        } else {
            Err(DbError::NotFound)
        }
    }

    async fn get_all(&self, filter: &R::Filter, filters: &Filters) -> DbResult<(Vec<R>, Metadata)> {
        let (rows, total) = self.list_page(filter, filters).await?;
        Ok((rows, calculate_metadata(total, filters.page, filters.page_size)))
    }
}

/// Turn the result of a conditional write into the protocol outcome.
pub fn apply_versioned_outcome<T: Versioned>(record: &mut T, outcome: Option<i32>) -> DbResult<()> {
    match outcome {
        Some(version) => {
            record.set_version(version);
            Ok(())
        }
        None => Err(DbError::EditConflict),
    }
}
