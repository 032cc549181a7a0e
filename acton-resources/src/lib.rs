//! # acton-resources
//!
//! Declarative generic REST resources for axum services.
//!
//! A resource is described once (a model store, an output schema, optional
//! input parameters, permission classes and pagination) and registered on a
//! [`Namespace`](namespace::Namespace). Registration composes one handler per
//! HTTP verb from an ordered chain of decorators, so the resulting routes and
//! their documentation always agree.
//!
//! ## Features
//!
//! - **Generic resources**: list, create and list+create over any [`Model`](repository::Model)
//! - **Decorator chains**: responses, parameters and permissions applied in a fixed order
//! - **Permissions first**: checks run before parameter validation and before storage
//! - **Pagination**: `offset`/`limit` query parameters with configurable bounds
//! - **Documentation**: every endpoint describes itself; `openapi` feature renders it
//! - **Graceful shutdown**: proper signal handling (SIGTERM, SIGINT)
//!
//! ## Example
//!
//! ```rust,ignore
//! use acton_resources::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let store = InMemoryStore::<Widget>::new();
//!     let widgets = ListCreateResource::new(
//!         ResourceDescriptor::new("widgets", JsonSchema::<Widget>::new("WidgetSchema"))
//!             .with_model(store)
//!             .with_pagination(PaginationParameters::from_config(&config.pagination))
//!             .with_permission(permission_class(|| Authenticated)),
//!     )?;
//!
//!     let mut ns = Namespace::new("widgets");
//!     ns.add_resource("/", widgets)?;
//!
//!     Server::new(config).serve(ns.router()).await
//! }
//! ```

pub mod config;
pub mod docs;
pub mod error;
pub mod generics;
pub mod handlers;
pub mod namespace;
pub mod observability;
pub mod parameters;
pub mod permissions;
pub mod repository;
pub mod schema;
pub mod server;

#[cfg(feature = "openapi")]
pub mod openapi;

#[cfg(test)]
mod testing;

pub mod prelude {
    //! Convenient re-exports for building resources

    pub use crate::config::{Config, MiddlewareConfig, PaginationConfig, ServiceConfig};
    pub use crate::docs::{ApiDocumentation, EndpointDoc, OperationDoc};
    pub use crate::error::{ContractError, Error, Result};
    pub use crate::observability::{init_tracing, shutdown_tracing};
    pub use crate::server::Server;

    // Resources
    pub use crate::generics::{
        CreateCapability, CreateResource, GenericResource, HandlerSettings, ListCapability,
        ListCreateResource, ListResource, ParameterSpec, ResourceDescriptor, ResourceView,
        ResponseSpec,
    };
    pub use crate::namespace::{Endpoint, Namespace, Resource, Verb};

    // Handler composition
    pub use crate::handlers::{
        apply, ApiError, ApiErrorKind, ApiOperation, Decorator, Handler, HandlerIdentity,
        HandlerResult, Next, Reply, RequestContext, ValidationErrors,
    };

    // Input, output and access control
    pub use crate::parameters::{
        PaginationParameters, ParameterField, ParameterLocation, ParameterValidator,
        SerdeParameters,
    };
    pub use crate::permissions::{
        permission_class, AllowAny, Authenticated, Claims, DenyAll, HasPermission, HasRole,
        Permission, PermissionClass, PermissionDenied,
    };
    pub use crate::schema::{JsonSchema, Schema};

    // Storage
    pub use crate::repository::{
        FilterCondition, FilterOperator, FilterValue, InMemoryStore, Model, ModelStore,
        Pagination, Query, RepositoryError, RepositoryErrorKind, RepositoryResult,
    };

    #[cfg(feature = "openapi")]
    pub use crate::openapi::{OpenApiBuilder, SwaggerUI};

    // Re-export commonly used external types
    pub use async_trait::async_trait;
    pub use axum::Router;
    pub use http::{Method, StatusCode};
    pub use serde::{Deserialize, Serialize};
}
