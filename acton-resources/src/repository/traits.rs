//! Repository trait definitions
//!
//! - [`Model`]: an entity type a resource can list and create
//! - [`QuerySource`]: executes a [`QuerySpec`] against storage
//! - [`ModelStore`]: the `.query` entry point plus unit-of-work factory
//! - [`UnitOfWork`]: a scoped transactional write
//!
//! These traits are object safe (`async_trait`) because resources hold their
//! store as `Arc<dyn ModelStore<M>>` chosen at runtime.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::RepositoryError;
use super::query::{Query, QuerySpec};

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// An entity type exposed through generic resources
///
/// # Example
///
/// ```rust
/// use acton_resources::repository::Model;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize)]
/// struct Team {
///     id: Option<u64>,
///     title: String,
/// }
///
/// #[derive(Deserialize)]
/// struct CreateTeam {
///     title: String,
/// }
///
/// impl Model for Team {
///     type Args = CreateTeam;
///     const NAME: &'static str = "team";
///
///     fn from_args(args: CreateTeam) -> Self {
///         Team { id: None, title: args.title }
///     }
///
///     fn primary_key(&self) -> Option<u64> {
///         self.id
///     }
///
///     fn set_primary_key(&mut self, id: u64) {
///         self.id = Some(id);
///     }
///
///     fn unique_fields(&self) -> Vec<(&'static str, String)> {
///         vec![("title", self.title.clone())]
///     }
/// }
/// ```
pub trait Model: Serialize + Clone + Send + Sync + 'static {
    /// Validated creation input
    type Args: DeserializeOwned + Send + 'static;

    /// Storage name of the entity (table, collection)
    const NAME: &'static str;

    /// Construct an in-memory entity from creation input
    fn from_args(args: Self::Args) -> Self;

    /// Primary key, `None` until persisted
    fn primary_key(&self) -> Option<u64>;

    /// Assign the primary key chosen by the store
    fn set_primary_key(&mut self, id: u64);

    /// Field/value pairs subject to a uniqueness constraint
    fn unique_fields(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Executes query specifications
#[async_trait::async_trait]
pub trait QuerySource<M>: Send + Sync {
    /// Fetch the rows selected by `spec`
    async fn fetch(&self, spec: &QuerySpec) -> RepositoryResult<Vec<M>>;

    /// Count the rows selected by `spec`, ignoring its window
    async fn count(&self, spec: &QuerySpec) -> RepositoryResult<u64>;
}

/// Storage for one model type
#[async_trait::async_trait]
pub trait ModelStore<M: Model>: Send + Sync {
    /// Lazy query over every stored entity
    fn query(&self) -> Query<M>;

    /// Open a unit of work
    async fn begin(&self) -> RepositoryResult<Box<dyn UnitOfWork<M>>>;
}

/// Scoped transactional write
///
/// Nothing staged through [`UnitOfWork::add`] is visible until
/// [`UnitOfWork::commit`] succeeds. A failed commit leaves storage
/// untouched, and dropping an uncommitted unit of work discards it.
#[async_trait::async_trait]
pub trait UnitOfWork<M: Model>: Send {
    /// Stage an entity for insertion
    fn add(&mut self, entity: M);

    /// Apply every staged entity atomically, returning them as persisted
    async fn commit(self: Box<Self>) -> RepositoryResult<Vec<M>>;

    /// Discard every staged entity
    async fn rollback(self: Box<Self>) -> RepositoryResult<()>;
}
