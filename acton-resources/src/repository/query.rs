//! Lazy, restartable queries
//!
//! A [`Query`] is a description plus a handle to the source that can run it.
//! Chaining never touches storage; [`Query::all`] and [`Query::count`] do,
//! and can be called any number of times.

use std::fmt;
use std::sync::Arc;

use super::pagination::{FilterCondition, Pagination};
use super::traits::{QuerySource, RepositoryResult};

/// What a query selects
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    /// Conditions joined with AND
    pub filters: Vec<FilterCondition>,
    /// Rows to skip
    pub offset: Option<u64>,
    /// Maximum rows to return
    pub limit: Option<u64>,
}

impl QuerySpec {
    /// Whether every filter accepts the serialized row
    pub fn accepts(&self, row: &serde_json::Value) -> bool {
        self.filters.iter().all(|condition| condition.matches(row))
    }
}

/// Lazy view over a model's storage collection
pub struct Query<M> {
    source: Arc<dyn QuerySource<M>>,
    spec: QuerySpec,
}

impl<M> Clone for Query<M> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            spec: self.spec.clone(),
        }
    }
}

impl<M> fmt::Debug for Query<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query").field("spec", &self.spec).finish()
    }
}

impl<M: Send + 'static> Query<M> {
    /// Unfiltered query over `source`
    pub fn new(source: Arc<dyn QuerySource<M>>) -> Self {
        Self {
            source,
            spec: QuerySpec::default(),
        }
    }

    /// Add a condition
    #[must_use]
    pub fn filter(mut self, condition: FilterCondition) -> Self {
        self.spec.filters.push(condition);
        self
    }

    /// Skip `offset` rows, replacing any earlier offset
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.spec.offset = Some(offset);
        self
    }

    /// Return at most `limit` rows, replacing any earlier limit
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.spec.limit = Some(limit);
        self
    }

    /// Apply an offset/limit window
    #[must_use]
    pub fn paginate(self, pagination: Pagination) -> Self {
        self.offset(pagination.offset).limit(pagination.limit)
    }

    /// The current specification
    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Execute and collect every selected row
    pub async fn all(&self) -> RepositoryResult<Vec<M>> {
        self.source.fetch(&self.spec).await
    }

    /// Count rows matching the filters
    pub async fn count(&self) -> RepositoryResult<u64> {
        self.source.count(&self.spec).await
    }
}
