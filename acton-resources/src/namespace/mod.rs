//! Namespaces: route registration, metadata decorators and documentation
//!
//! A [`Namespace`] groups resources under a common path prefix. It hands out
//! the three metadata decorators resources compose their handlers with:
//!
//! - [`Namespace::response`] records a response shape (documentation only)
//! - [`Namespace::parameters`] validates raw input into the context's args slot
//! - [`Namespace::permission_required`] installs a permission guard
//!
//! Once every resource is registered, [`Namespace::router`] turns the
//! composed handlers into an axum [`Router`] and [`Namespace::documentation`]
//! reads their metadata back out.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use acton_resources::namespace::Namespace;
//! use acton_resources::permissions::AllowAny;
//! use http::StatusCode;
//!
//! let ns = Namespace::new("widgets").with_description("Widget catalogue");
//! let decorators = vec![
//!     ns.response(StatusCode::OK, Some("WidgetSchema".to_string()), true),
//!     ns.permission_required(Arc::new(AllowAny)),
//! ];
//! assert_eq!(decorators.len(), 2);
//! assert_eq!(ns.path(), "/widgets");
//! ```

mod endpoint;

pub use endpoint::{Endpoint, Resource, Verb};

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use axum::routing::MethodRouter;
use axum::Router;
use http::StatusCode;
use serde_json::{Map, Value};

use crate::docs::{ApiDocumentation, OperationDoc, ParametersDoc, ResponseDoc};
use crate::error::ContractError;
use crate::handlers::{ApiError, ApiOperation, Decorator, Handler, RequestContext};
use crate::parameters::{ParameterLocation, ParameterValidator};
use crate::permissions::Permission;

/// A group of resources sharing a path prefix
#[derive(Debug, Clone)]
pub struct Namespace {
    name: String,
    path: String,
    description: Option<String>,
    endpoints: BTreeMap<String, Endpoint>,
}

impl Namespace {
    /// Namespace mounted at `/{name}`
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let path = format!("/{}", name.trim_matches('/'));
        Self {
            name,
            path,
            description: None,
            endpoints: BTreeMap::new(),
        }
    }

    /// Mount at a different prefix; `"/"` mounts at the root
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        let trimmed = path.trim_end_matches('/');
        self.path = if trimmed.is_empty() {
            "/".to_string()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        };
        self
    }

    /// Human-readable description for documentation
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Namespace name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path prefix
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Record a response shape
    pub fn response(&self, code: StatusCode, schema: Option<String>, many: bool) -> Decorator {
        let doc = ResponseDoc {
            description: code.canonical_reason().unwrap_or_default().to_string(),
            schema,
            many,
        };
        Decorator::new(format!("response({})", code.as_u16()), move |mut handler: Handler| {
            handler.doc_mut().responses.insert(code.as_u16(), doc.clone());
            handler
        })
    }

    /// Validate raw input with `validator` before the wrapped handler runs
    ///
    /// Query input comes from the URI; JSON input comes from the body, which
    /// must be an object when present. Validated output is stored with
    /// [`RequestContext::set_args`]. Any failure answers 400 without calling
    /// the wrapped handler.
    pub fn parameters(
        &self,
        validator: Arc<dyn ParameterValidator>,
        location: ParameterLocation,
    ) -> Decorator {
        let label = format!("parameters({})", validator.name());
        Decorator::new(label, move |handler: Handler| {
            let doc = ParametersDoc {
                name: validator.name().to_string(),
                location,
                fields: validator.fields(),
            };
            let validator = Arc::clone(&validator);
            let mut handler = handler.wrap(move |mut ctx, next| {
                let validator = Arc::clone(&validator);
                async move {
                    let raw = raw_input(&ctx, location)?;
                    match validator.validate(&raw) {
                        Ok(args) => {
                            ctx.set_args(args);
                            next.run(ctx).await
                        }
                        Err(errors) => {
                            tracing::debug!(
                                validator = %validator.name(),
                                %location,
                                errors = %errors,
                                "Parameter validation failed"
                            );
                            Err(ApiError::validation_failed(ApiOperation::Validate, errors))
                        }
                    }
                }
            });
            handler.doc_mut().parameters = Some(doc);
            handler
        })
    }

    /// Require `permission` before the handler (and its validation) runs
    pub fn permission_required(&self, permission: Arc<dyn Permission>) -> Decorator {
        let label = format!("permission_required({})", permission.name());
        Decorator::new(label, move |handler: Handler| handler.guard(Arc::clone(&permission)))
    }

    /// Build `resource`'s endpoint and register it under `route`
    pub fn add_resource<R: Resource>(
        &mut self,
        route: &str,
        resource: R,
    ) -> Result<&mut Self, ContractError> {
        let path = self.full_path(route)?;
        if self.endpoints.contains_key(&path) {
            return Err(self.duplicate(path));
        }

        let name = resource.name().to_string();
        let endpoint = Arc::new(resource).endpoint(self)?;
        tracing::debug!(
            namespace = %self.name,
            resource = %name,
            path = %path,
            verbs = ?endpoint.verbs(),
            "Registered resource"
        );
        self.endpoints.insert(path, endpoint);
        Ok(self)
    }

    /// Register an already composed endpoint under `route`
    pub fn add_endpoint(
        &mut self,
        route: &str,
        endpoint: Endpoint,
    ) -> Result<&mut Self, ContractError> {
        let path = self.full_path(route)?;
        if self.endpoints.contains_key(&path) {
            return Err(self.duplicate(path));
        }
        self.endpoints.insert(path, endpoint);
        Ok(self)
    }

    /// Endpoint registered at a full path
    pub fn endpoint(&self, path: &str) -> Option<&Endpoint> {
        self.endpoints.get(path)
    }

    /// Registered full paths
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    /// Documentation read from the composed handlers
    pub fn documentation(&self) -> ApiDocumentation {
        let paths = self
            .endpoints
            .iter()
            .filter(|(_, endpoint)| !endpoint.is_empty())
            .map(|(path, endpoint)| {
                let operations = endpoint
                    .handlers()
                    .map(|(verb, handler)| OperationDoc {
                        method: verb.to_string(),
                        handler: handler.identity().name.clone(),
                        signature: handler.identity().signature.clone(),
                        doc: handler.doc().clone(),
                    })
                    .collect();
                (path.clone(), operations)
            })
            .collect();

        ApiDocumentation {
            namespace: self.name.clone(),
            description: self.description.clone(),
            paths,
        }
    }

    /// Build the transport router
    ///
    /// Each verb handler is registered by value; the router does not observe
    /// registrations made after this call.
    pub fn router(&self) -> Router {
        let mut router = Router::new();

        for (path, endpoint) in &self.endpoints {
            if endpoint.is_empty() {
                continue;
            }

            let mut methods: MethodRouter = MethodRouter::new();
            for (verb, handler) in endpoint.handlers() {
                let handler = handler.clone();
                methods = methods.on(verb.method_filter(), move |request: Request| {
                    let handler = handler.clone();
                    async move { dispatch(handler, request).await }
                });
            }
            router = router.route(path, methods);
        }

        router
    }

    fn full_path(&self, route: &str) -> Result<String, ContractError> {
        if !route.starts_with('/') {
            return Err(ContractError::InvalidPath {
                path: route.to_string(),
            });
        }

        let route = route.trim_end_matches('/');
        Ok(match (self.path.as_str(), route) {
            ("/", "") => "/".to_string(),
            ("/", route) => route.to_string(),
            (base, "") => base.to_string(),
            (base, route) => format!("{}{}", base, route),
        })
    }

    fn duplicate(&self, path: String) -> ContractError {
        ContractError::DuplicateRoute {
            namespace: self.name.clone(),
            path,
        }
    }
}

fn raw_input(ctx: &RequestContext, location: ParameterLocation) -> Result<Map<String, Value>, ApiError> {
    match location {
        ParameterLocation::Query => Ok(ctx.query().clone()),
        ParameterLocation::Json => match ctx.body() {
            None | Some(Value::Null) => Ok(Map::new()),
            Some(Value::Object(fields)) => Ok(fields.clone()),
            Some(_) => Err(ApiError::bad_request(
                ApiOperation::Validate,
                "Request body must be a JSON object",
            )),
        },
    }
}

/// Authorize on the request head, then read input and run the pipeline
///
/// Body size is enforced by the server's `RequestBodyLimitLayer`; a body cut
/// short by that layer surfaces here as 413.
async fn dispatch(handler: Handler, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let mut ctx = RequestContext::from_parts(parts).await;

    if let Err(e) = handler.authorize(&ctx) {
        return e.into_response();
    }
    if let Err(e) = ctx.read_input(body, usize::MAX).await {
        return e.into_response();
    }

    match handler.run_authorized(ctx).await {
        Ok(reply) => reply.into_response(),
        Err(e) => e.into_response(),
    }
}
