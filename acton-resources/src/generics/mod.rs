//! Declarative generic resources
//!
//! A resource is declared once with a [`ResourceDescriptor`] (store, schema,
//! parameters, pagination, permission classes) and turned into composed verb
//! handlers when it is registered with a [`Namespace`](crate::namespace::Namespace):
//!
//! - [`ListResource`]: `GET` lists the collection, optionally paginated
//! - [`CreateResource`]: `POST` creates one entity, 409 on uniqueness conflicts
//! - [`ListCreateResource`]: both, each verb composed independently
//! - [`ResourceView`]: hand-written verbs that still receive permission checks
//!
//! Handlers are composed from [`HandlerSettings`] in the order responses,
//! parameters, permissions. At request time permission checks run first,
//! then parameter validation, then the capability itself.
//!
//! # Example
//!
//! ```rust,ignore
//! use acton_resources::prelude::*;
//!
//! let store = InMemoryStore::<Widget>::new();
//! let widgets = ListCreateResource::new(
//!     ResourceDescriptor::new("widgets", JsonSchema::<Widget>::new("WidgetSchema"))
//!         .with_model(store.clone())
//!         .with_pagination(PaginationParameters::new().with_default_limit(10))
//!         .with_permission(permission_class(|| Authenticated)),
//! )?;
//!
//! let mut ns = Namespace::new("widgets");
//! ns.add_resource("/", widgets)?;
//! let app = ns.router();
//! ```

mod base;
mod create;
mod list;
mod list_create;
mod settings;
mod view;

pub use base::{GenericResource, ResourceDescriptor};
pub use create::{CreateCapability, CreateResource};
pub use list::{ListCapability, ListResource};
pub use list_create::ListCreateResource;
pub use settings::{HandlerSettings, ParameterSpec, ResponseSpec};
pub use view::ResourceView;
