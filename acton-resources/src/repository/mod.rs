//! Storage abstractions consumed by generic resources
//!
//! Resources never talk to a database directly. They see:
//!
//! - **Models**: [`Model`] describes an entity, how to build it from creation
//!   input, its primary key, and its uniqueness constraints
//! - **Queries**: [`Query`] is a lazy, restartable, filterable view with
//!   `offset`/`limit`, obtained from [`ModelStore::query`]
//! - **Units of work**: [`UnitOfWork`] stages writes and commits them
//!   atomically, reporting uniqueness conflicts as
//!   [`RepositoryErrorKind::Integrity`]
//!
//! [`InMemoryStore`] implements all of it and is what the tests run against.
//!
//! # Example
//!
//! ```rust,ignore
//! use acton_resources::repository::{FilterCondition, InMemoryStore, ModelStore};
//!
//! let store = InMemoryStore::<Widget>::new();
//! store.insert(Widget::named("sprocket")).await?;
//!
//! let page = store
//!     .query()
//!     .filter(FilterCondition::like("name", "spr%"))
//!     .offset(0)
//!     .limit(10)
//!     .all()
//!     .await?;
//! ```

mod error;
mod memory;
mod pagination;
mod query;
mod traits;

// Re-export all public types
pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use memory::InMemoryStore;
pub use pagination::{FilterCondition, FilterOperator, FilterValue, Pagination};
pub use query::{Query, QuerySpec};
pub use traits::{Model, ModelStore, QuerySource, RepositoryResult, UnitOfWork};
