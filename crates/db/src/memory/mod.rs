//! In-process store implementations.
//!
//! Same contracts as the PostgreSQL repositories, backed by
//! `parking_lot::RwLock` maps. The version-checked update runs entirely under
//! the write lock, which makes it the compare-and-swap the database's
//! conditional `UPDATE` provides.
//!
//! Tables can be linked parent to child. A child insert naming a missing
//! parent fails with `MissingReference`, and deleting a parent removes its
//! children, matching the `REFERENCES ... ON DELETE CASCADE` columns.

mod accounts;
mod rows;

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use chrono::Utc;
use episodic_core::filters::{Filters, SortDirection};
use episodic_core::types::{DbId, Timestamp};
use parking_lot::RwLock;

use crate::error::{DbError, DbResult};
use crate::resource::{Resource, ResourceStore};

pub use accounts::{MemoryPermissionStore, MemoryTokenStore, MemoryUserStore};

/// A comparable projection of one sortable column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Int(i64),
    Text(String),
}

/// What a resource must provide to live in a [`MemoryStore`].
pub trait InMemoryRow: Resource {
    /// Materialize a stored row (version 1) from a draft.
    fn from_draft(id: DbId, created_at: Timestamp, draft: &Self::Draft) -> Self;

    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Value of `column` for ordering. Only called with safelisted columns.
    fn sort_key(&self, column: &str) -> SortKey;

    /// The referencing column and the parent row it points at, for rows
    /// that belong to a parent table.
    fn parent_ref(&self) -> Option<(&'static str, DbId)> {
        None
    }
}

/// A table other tables can reference.
pub trait ParentTable: Send + Sync {
    fn contains(&self, id: DbId) -> bool;
}

/// A table whose rows go away with their parent.
pub trait ChildTable: Send + Sync {
    fn remove_children_of(&self, parent_id: DbId);
}

struct Table<R> {
    next_id: DbId,
    rows: BTreeMap<DbId, R>,
}

pub struct MemoryStore<R> {
    table: RwLock<Table<R>>,
    parent: Option<Arc<dyn ParentTable>>,
    children: RwLock<Vec<Weak<dyn ChildTable>>>,
}

impl<R> MemoryStore<R> {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
            parent: None,
            children: RwLock::new(Vec::new()),
        }
    }

    /// A table whose rows must reference an existing row of `parent`.
    pub fn with_parent(parent: Arc<dyn ParentTable>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::new()
        }
    }

    /// Delete `child`'s rows whenever their parent row here is deleted.
    pub fn cascade_to<C: ChildTable + 'static>(&self, child: &Arc<C>) {
        let child: Arc<dyn ChildTable> = child.clone();
        self.children.write().push(Arc::downgrade(&child));
    }

    pub fn len(&self) -> usize {
        self.table.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: InMemoryRow> ParentTable for MemoryStore<R> {
    fn contains(&self, id: DbId) -> bool {
        self.table.read().rows.contains_key(&id)
    }
}

impl<R: InMemoryRow> ChildTable for MemoryStore<R> {
    fn remove_children_of(&self, parent_id: DbId) {
        self.table
            .write()
            .rows
            .retain(|_, row| row.parent_ref().map(|(_, id)| id) != Some(parent_id));
    }
}

#[async_trait]
impl<R: InMemoryRow> ResourceStore<R> for MemoryStore<R> {
    async fn insert(&self, draft: &R::Draft) -> DbResult<R> {
        // The child lock is held across the parent check. A parent delete
        // racing this insert cascades only after taking the same lock.
        let mut table = self.table.write();
        let id = table.next_id;

        let row = R::from_draft(id, Utc::now(), draft);
        if let (Some(parent), Some((column, parent_id))) = (&self.parent, row.parent_ref()) {
            if !parent.contains(parent_id) {
                return Err(DbError::MissingReference(column));
            }
        }

        table.next_id += 1;
        table.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: DbId) -> DbResult<Option<R>> {
        Ok(self.table.read().rows.get(&id).cloned())
    }

    async fn update_if_version(&self, record: &R) -> DbResult<Option<i32>> {
        let mut table = self.table.write();
        match table.rows.get_mut(&record.id()) {
            Some(current) if current.version() == record.version() => {
                let next_version = record.version() + 1;
                let mut next = record.clone();
                next.set_version(next_version);
                *current = next;
                Ok(Some(next_version))
            }
            _ => Ok(None),
        }
    }

    async fn delete_by_id(&self, id: DbId) -> DbResult<bool> {
        let removed = self.table.write().rows.remove(&id).is_some();
        if removed {
            for child in self.children.read().iter().filter_map(Weak::upgrade) {
                child.remove_children_of(id);
            }
        }
        Ok(removed)
    }

    async fn list_page(&self, filter: &R::Filter, filters: &Filters) -> DbResult<(Vec<R>, i64)> {
        let column = filters.sort_column();
        let direction = filters.sort_direction();

        let mut matching: Vec<R> = self
            .table
            .read()
            .rows
            .values()
            .filter(|row| row.matches(filter))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let primary = a.sort_key(column).cmp(&b.sort_key(column));
            let primary = match direction {
                SortDirection::Asc => primary,
                SortDirection::Desc => primary.reverse(),
            };
            primary.then_with(|| a.id().cmp(&b.id()))
        });

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filters.offset().max(0) as usize)
            .take(filters.limit().max(0) as usize)
            .collect();
        Ok((page, total))
    }
}

/// True when every word of `query` appears as a word of `text`,
/// case-insensitively. An empty query matches everything.
pub(crate) fn contains_words(text: &str, query: &str) -> bool {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    query
        .split_whitespace()
        .map(str::to_lowercase)
        .all(|q| words.iter().any(|w| *w == q))
}
