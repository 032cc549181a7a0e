//! Decorator-chain application
//!
//! A [`Handler`] is an async callable plus everything known about it without
//! running it: its identity (name and declared signature), its documentation,
//! and the permission guards that run ahead of it. A [`Decorator`] turns one
//! handler into another; [`apply`] folds a list of decorators over a target so
//! that the first-listed decorator ends up outermost.
//!
//! ```text
//! apply([d1, d2, d3], target) == d1(d2(d3(target)))
//! ```
//!
//! Calling a handler runs its permission guards first, in declared order, then
//! the wrapped pipeline. Decorators never change a handler's identity:
//! [`Decorator::decorate`] restores it even if the wrapping function built a
//! fresh handler.
//!
//! # Example
//!
//! ```rust
//! use acton_resources::handlers::{apply, Decorator, Handler, HandlerIdentity, Reply, RequestContext};
//! use serde_json::json;
//!
//! let target = Handler::new(HandlerIdentity::new("widgets.list", &["filters"]), |_ctx| async {
//!     Ok(Reply::ok(json!([])))
//! });
//! let noted = Decorator::new("note", |mut handler: Handler| {
//!     handler.doc_mut().permissions.push("Documented".to_string());
//!     handler
//! });
//!
//! let composed = apply(&[noted], target);
//! assert_eq!(composed.identity().name, "widgets.list");
//! assert_eq!(composed.doc().permissions, vec!["Documented".to_string()]);
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use super::context::RequestContext;
use super::error::ApiError;
use super::response::Reply;
use crate::docs::EndpointDoc;
use crate::permissions::Permission;

/// Result of running a handler
pub type HandlerResult = Result<Reply, ApiError>;

type CallFn = dyn Fn(RequestContext) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// Introspectable identity of a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerIdentity {
    /// Handler name, e.g. `widgets.list`
    pub name: String,
    /// Declared parameter names
    pub signature: Vec<String>,
}

impl HandlerIdentity {
    /// Create an identity
    pub fn new(name: impl Into<String>, signature: &[&str]) -> Self {
        Self {
            name: name.into(),
            signature: signature.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// The rest of the pipeline, as seen from inside a wrapping decorator
#[derive(Clone)]
pub struct Next {
    call: Arc<CallFn>,
}

impl Next {
    /// Run the inner pipeline
    pub async fn run(&self, ctx: RequestContext) -> HandlerResult {
        (self.call)(ctx).await
    }
}

/// Composable async request handler
#[derive(Clone)]
pub struct Handler {
    identity: HandlerIdentity,
    doc: EndpointDoc,
    guards: Vec<Arc<dyn Permission>>,
    call: Arc<CallFn>,
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("identity", &self.identity)
            .field("doc", &self.doc)
            .field("guards", &self.guard_names())
            .finish()
    }
}

impl Handler {
    /// Wrap an async function as a handler
    pub fn new<F, Fut>(identity: HandlerIdentity, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            identity,
            doc: EndpointDoc::default(),
            guards: Vec::new(),
            call: Arc::new(move |ctx| -> BoxFuture<'static, HandlerResult> { Box::pin(f(ctx)) }),
        }
    }

    /// Identity of the original target
    pub fn identity(&self) -> &HandlerIdentity {
        &self.identity
    }

    /// Declared documentation
    pub fn doc(&self) -> &EndpointDoc {
        &self.doc
    }

    /// Mutable documentation, for documentation-only decorators
    pub fn doc_mut(&mut self) -> &mut EndpointDoc {
        &mut self.doc
    }

    /// Names of the permission guards in the order they run
    pub fn guard_names(&self) -> Vec<String> {
        self.guards.iter().map(|guard| guard.name()).collect()
    }

    /// Whether any permission guard is attached
    pub fn has_guards(&self) -> bool {
        !self.guards.is_empty()
    }

    /// Install a permission guard ahead of every guard already attached
    ///
    /// Decorators are applied innermost first, so prepending keeps the
    /// declared order at call time.
    #[must_use]
    pub fn guard(mut self, permission: Arc<dyn Permission>) -> Self {
        self.doc.permissions.insert(0, permission.name());
        self.guards.insert(0, permission);
        self
    }

    /// Wrap the pipeline with `f`, which receives the context and the rest of the pipeline
    #[must_use]
    pub fn wrap<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(RequestContext, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let next = Next {
            call: Arc::clone(&self.call),
        };
        self.call = Arc::new(move |ctx| -> BoxFuture<'static, HandlerResult> {
            Box::pin(f(ctx, next.clone()))
        });
        self
    }

    /// Run permission guards in declared order, stopping at the first rejection
    ///
    /// Guards see the request head only; the body has not been read yet when
    /// a namespace route authorizes a request.
    pub fn authorize(&self, ctx: &RequestContext) -> Result<(), ApiError> {
        for guard in &self.guards {
            if let Err(denied) = guard.check(ctx) {
                tracing::warn!(
                    handler = %self.identity.name,
                    permission = %guard.name(),
                    status = denied.status().as_u16(),
                    "Permission denied"
                );
                return Err(denied.into());
            }
        }
        Ok(())
    }

    /// Run the pipeline without permission guards
    ///
    /// Callers must have passed [`Handler::authorize`] for the same request.
    pub async fn run_authorized(&self, ctx: RequestContext) -> HandlerResult {
        (self.call)(ctx).await
    }

    /// Run permission guards, then the pipeline
    pub async fn call(&self, ctx: RequestContext) -> HandlerResult {
        self.authorize(&ctx)?;
        self.run_authorized(ctx).await
    }
}

/// Labelled handler transformation
#[derive(Clone)]
pub struct Decorator {
    label: String,
    apply: Arc<dyn Fn(Handler) -> Handler + Send + Sync>,
}

impl fmt::Debug for Decorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decorator").field("label", &self.label).finish()
    }
}

impl Decorator {
    /// Create a decorator from a transformation
    pub fn new<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(Handler) -> Handler + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            apply: Arc::new(f),
        }
    }

    /// Label for introspection
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Apply to one handler, keeping its identity
    pub fn decorate(&self, handler: Handler) -> Handler {
        let identity = handler.identity.clone();
        let mut decorated = (self.apply)(handler);
        decorated.identity = identity;
        decorated
    }
}

/// Apply `decorators` to `target`, first-listed outermost
pub fn apply(decorators: &[Decorator], target: Handler) -> Handler {
    decorators
        .iter()
        .rev()
        .fold(target, |handler, decorator| decorator.decorate(handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{recording_permission, CallLog};
    use http::Method;
    use serde_json::json;

    fn ctx() -> RequestContext {
        RequestContext::new(Method::GET, "/widgets".parse().unwrap())
    }

    fn target(log: CallLog) -> Handler {
        Handler::new(HandlerIdentity::new("widgets.list", &["filters"]), move |_ctx| {
            let log = log.clone();
            async move {
                log.record("target");
                Ok(Reply::ok(json!([])))
            }
        })
    }

    fn tracing_decorator(label: &'static str, log: CallLog) -> Decorator {
        Decorator::new(label, move |handler: Handler| {
            let log = log.clone();
            handler.wrap(move |ctx, next| {
                let log = log.clone();
                async move {
                    log.record(label);
                    next.run(ctx).await
                }
            })
        })
    }

    #[tokio::test]
    async fn test_first_listed_decorator_runs_first() {
        let log = CallLog::default();
        let decorators = vec![
            tracing_decorator("outer", log.clone()),
            tracing_decorator("middle", log.clone()),
            tracing_decorator("inner", log.clone()),
        ];

        let handler = apply(&decorators, target(log.clone()));
        handler.call(ctx()).await.unwrap();

        assert_eq!(log.entries(), vec!["outer", "middle", "inner", "target"]);
    }

    #[tokio::test]
    async fn test_guards_run_before_wrapping_decorators() {
        let log = CallLog::default();
        let first = recording_permission("first", true, log.clone());
        let second = recording_permission("second", true, log.clone());
        let decorators = vec![
            tracing_decorator("validate", log.clone()),
            Decorator::new("first", move |h: Handler| h.guard(first.clone())),
            Decorator::new("second", move |h: Handler| h.guard(second.clone())),
        ];

        let handler = apply(&decorators, target(log.clone()));
        assert_eq!(handler.guard_names(), vec!["first", "second"]);
        assert_eq!(handler.doc().permissions, vec!["first", "second"]);

        handler.call(ctx()).await.unwrap();
        assert_eq!(log.entries(), vec!["first", "second", "validate", "target"]);
    }

    #[tokio::test]
    async fn test_rejecting_guard_short_circuits() {
        let log = CallLog::default();
        let deny = recording_permission("deny", false, log.clone());
        let handler = apply(
            &[
                Decorator::new("deny", move |h: Handler| h.guard(deny.clone())),
                tracing_decorator("validate", log.clone()),
            ],
            target(log.clone()),
        );

        let err = handler.call(ctx()).await.unwrap_err();
        assert_eq!(err.kind, crate::handlers::ApiErrorKind::Forbidden);
        assert_eq!(log.entries(), vec!["deny"]);
    }

    #[test]
    fn test_identity_survives_replacement() {
        let replacing = Decorator::new("replace", |_handler: Handler| {
            Handler::new(HandlerIdentity::new("anonymous", &[]), |_ctx| async {
                Ok(Reply::ok(json!(null)))
            })
        });

        let handler = apply(&[replacing], target(CallLog::default()));
        assert_eq!(handler.identity(), &HandlerIdentity::new("widgets.list", &["filters"]));
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let handler = apply(&[], target(CallLog::default()));
        assert_eq!(handler.identity().name, "widgets.list");
        assert!(!handler.has_guards());
        assert_eq!(handler.doc(), &EndpointDoc::default());
    }
}
