//! In-memory model store
//!
//! Rows are held behind a `tokio::sync::RwLock`; clones of the store share
//! the same rows. Commits take the write lock for their whole duration, so
//! a unit of work is applied completely or not at all.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use super::error::{RepositoryError, RepositoryOperation};
use super::query::{Query, QuerySpec};
use super::traits::{Model, ModelStore, QuerySource, RepositoryResult, UnitOfWork};

struct Shared<M> {
    rows: RwLock<Vec<M>>,
    next_id: AtomicU64,
    accesses: AtomicU64,
}

/// Thread-safe in-memory [`ModelStore`]
///
/// Enforces [`Model::unique_fields`] and primary-key uniqueness at commit,
/// assigns sequential primary keys starting at 1, and counts storage
/// accesses (query executions and opened units of work).
///
/// ```rust
/// # use acton_resources::repository::{InMemoryStore, Model};
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Clone, Serialize)] struct Tag { id: Option<u64>, label: String }
/// # #[derive(Deserialize)] struct NewTag { label: String }
/// # impl Model for Tag {
/// #     type Args = NewTag;
/// #     const NAME: &'static str = "tag";
/// #     fn from_args(a: NewTag) -> Self { Tag { id: None, label: a.label } }
/// #     fn primary_key(&self) -> Option<u64> { self.id }
/// #     fn set_primary_key(&mut self, id: u64) { self.id = Some(id) }
/// # }
/// let store: InMemoryStore<Tag> = InMemoryStore::new();
/// assert_eq!(store.access_count(), 0);
/// ```
pub struct InMemoryStore<M> {
    inner: Arc<Shared<M>>,
}

impl<M> Clone for InMemoryStore<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: Model> Default for InMemoryStore<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> InMemoryStore<M> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Shared {
                rows: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                accesses: AtomicU64::new(0),
            }),
        }
    }

    /// Number of storage accesses so far
    pub fn access_count(&self) -> u64 {
        self.inner.accesses.load(Ordering::SeqCst)
    }

    /// Reset the access counter
    pub fn reset_access_count(&self) {
        self.inner.accesses.store(0, Ordering::SeqCst);
    }

    /// Number of stored rows
    pub async fn len(&self) -> usize {
        self.inner.rows.read().await.len()
    }

    /// Whether the store holds no rows
    pub async fn is_empty(&self) -> bool {
        self.inner.rows.read().await.is_empty()
    }

    /// Persist one entity through a unit of work
    pub async fn insert(&self, entity: M) -> RepositoryResult<M> {
        let mut unit = self.begin().await?;
        unit.add(entity);
        let mut persisted = unit.commit().await?;
        persisted
            .pop()
            .ok_or_else(|| RepositoryError::other("commit returned no rows"))
    }

    /// Remove every row
    pub async fn clear(&self) {
        self.inner.rows.write().await.clear();
    }
}

#[async_trait::async_trait]
impl<M: Model> QuerySource<M> for Shared<M> {
    async fn fetch(&self, spec: &QuerySpec) -> RepositoryResult<Vec<M>> {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.read().await;

        let mut selected = Vec::new();
        for row in rows.iter() {
            let document = serde_json::to_value(row).map_err(|e| {
                RepositoryError::other(format!("failed to serialize {}: {}", M::NAME, e))
            })?;
            if spec.accepts(&document) {
                selected.push(row.clone());
            }
        }

        let offset = usize::try_from(spec.offset.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = spec
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        Ok(selected.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, spec: &QuerySpec) -> RepositoryResult<u64> {
        let unwindowed = QuerySpec {
            filters: spec.filters.clone(),
            ..QuerySpec::default()
        };
        let rows = self.fetch(&unwindowed).await?;
        Ok(rows.len() as u64)
    }
}

#[async_trait::async_trait]
impl<M: Model> ModelStore<M> for InMemoryStore<M> {
    fn query(&self) -> Query<M> {
        let source: Arc<dyn QuerySource<M>> = self.inner.clone();
        Query::new(source)
    }

    async fn begin(&self) -> RepositoryResult<Box<dyn UnitOfWork<M>>> {
        self.inner.accesses.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryUnitOfWork {
            store: Arc::clone(&self.inner),
            staged: Vec::new(),
        }))
    }
}

struct MemoryUnitOfWork<M> {
    store: Arc<Shared<M>>,
    staged: Vec<M>,
}

#[async_trait::async_trait]
impl<M: Model> UnitOfWork<M> for MemoryUnitOfWork<M> {
    fn add(&mut self, entity: M) {
        self.staged.push(entity);
    }

    async fn commit(self: Box<Self>) -> RepositoryResult<Vec<M>> {
        let MemoryUnitOfWork { store, staged } = *self;
        let mut rows = store.rows.write().await;

        let mut taken: HashSet<(&'static str, String)> =
            rows.iter().flat_map(|row| row.unique_fields()).collect();
        let mut keys: HashSet<u64> = rows.iter().filter_map(|row| row.primary_key()).collect();

        for entity in &staged {
            if let Some(id) = entity.primary_key() {
                if !keys.insert(id) {
                    return Err(RepositoryError::integrity(format!(
                        "UNIQUE constraint failed: {}.id",
                        M::NAME
                    )));
                }
            }
            for (field, value) in entity.unique_fields() {
                if !taken.insert((field, value)) {
                    return Err(RepositoryError::integrity(format!(
                        "UNIQUE constraint failed: {}.{}",
                        M::NAME,
                        field
                    )));
                }
            }
        }

        let mut persisted = Vec::with_capacity(staged.len());
        for mut entity in staged {
            if entity.primary_key().is_none() {
                let mut id = store.next_id.fetch_add(1, Ordering::SeqCst);
                while keys.contains(&id) {
                    id = store.next_id.fetch_add(1, Ordering::SeqCst);
                }
                keys.insert(id);
                entity.set_primary_key(id);
            }
            rows.push(entity.clone());
            persisted.push(entity);
        }

        tracing::debug!(model = M::NAME, rows = persisted.len(), "Committed unit of work");
        Ok(persisted)
    }

    async fn rollback(self: Box<Self>) -> RepositoryResult<()> {
        tracing::debug!(
            model = M::NAME,
            operation = %RepositoryOperation::Rollback,
            discarded = self.staged.len(),
            "Rolled back unit of work"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{FilterCondition, RepositoryErrorKind};
    use crate::testing::Widget;

    #[tokio::test]
    async fn test_commit_assigns_ids_and_becomes_visible() {
        let store = InMemoryStore::<Widget>::new();
        let mut unit = store.begin().await.unwrap();
        unit.add(Widget::named("alpha"));
        unit.add(Widget::named("beta"));

        assert!(store.is_empty().await);
        let persisted = unit.commit().await.unwrap();

        assert_eq!(persisted[0].id, Some(1));
        assert_eq!(persisted[1].id, Some(2));
        assert_eq!(store.query().all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unique_violation_commits_nothing() {
        let store = InMemoryStore::<Widget>::new();
        store.insert(Widget::named("alpha")).await.unwrap();

        let mut unit = store.begin().await.unwrap();
        unit.add(Widget::named("gamma"));
        unit.add(Widget::named("alpha"));
        let err = unit.commit().await.unwrap_err();

        assert_eq!(err.kind, RepositoryErrorKind::Integrity);
        assert_eq!(err.message, "UNIQUE constraint failed: widget.name");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_rollback_and_drop_discard() {
        let store = InMemoryStore::<Widget>::new();

        let mut unit = store.begin().await.unwrap();
        unit.add(Widget::named("alpha"));
        unit.rollback().await.unwrap();

        let mut unit = store.begin().await.unwrap();
        unit.add(Widget::named("beta"));
        drop(unit);

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_query_is_lazy_and_restartable() {
        let store = InMemoryStore::<Widget>::new();
        for name in ["a", "b", "c", "d"] {
            store.insert(Widget::named(name)).await.unwrap();
        }
        store.reset_access_count();

        let query = store.query().filter(FilterCondition::ne("name", "b")).offset(1).limit(5);
        assert_eq!(store.access_count(), 0);

        let first = query.all().await.unwrap();
        let second = query.all().await.unwrap();
        let names: Vec<_> = first.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["c", "d"]);
        assert_eq!(first.len(), second.len());
        assert_eq!(query.count().await.unwrap(), 3);
        assert_eq!(store.access_count(), 3);
    }

    #[tokio::test]
    async fn test_clones_share_rows() {
        let store = InMemoryStore::<Widget>::new();
        let handle = store.clone();
        store.insert(Widget::named("shared")).await.unwrap();
        assert_eq!(handle.len().await, 1);
        handle.clear().await;
        assert!(store.is_empty().await);
    }
}
