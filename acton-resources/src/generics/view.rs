//! Resources with hand-written verb handlers

use std::future::Future;
use std::sync::Arc;

use super::base::{GenericResource, ResourceDescriptor};
use crate::error::ContractError;
use crate::handlers::{Handler, HandlerIdentity, HandlerResult, RequestContext};
use crate::namespace::{Endpoint, Namespace, Resource, Verb};
use crate::repository::Model;

/// A resource whose verbs are plain async functions
///
/// Handlers receive the shared descriptor, so they can reach the store and
/// schema the same way generated handlers do. At registration the
/// descriptor's permission classes are applied to every verb through
/// [`GenericResource::document`].
///
/// # Example
///
/// ```rust,ignore
/// let view = ResourceView::new(descriptor).on(Verb::Get, |descriptor, _ctx| async move {
///     let count = descriptor.queryset()?.count().await?;
///     Ok::<_, ApiError>(Reply::ok(json!({ "count": count })))
/// });
/// namespace.add_resource("/count", view)?;
/// ```
pub struct ResourceView<M: Model> {
    descriptor: Arc<ResourceDescriptor<M>>,
    endpoint: Endpoint,
}

impl<M: Model> ResourceView<M> {
    /// View with no verbs
    pub fn new(descriptor: ResourceDescriptor<M>) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            endpoint: Endpoint::new(),
        }
    }

    /// Answer `verb` with `f`
    #[must_use]
    pub fn on<F, Fut>(mut self, verb: Verb, f: F) -> Self
    where
        F: Fn(Arc<ResourceDescriptor<M>>, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let descriptor = Arc::clone(&self.descriptor);
        let identity = HandlerIdentity::new(
            format!("{}.{}", descriptor.name(), verb.as_str().to_lowercase()),
            &["ctx"],
        );
        let handler = Handler::new(identity, move |ctx| f(Arc::clone(&descriptor), ctx));
        self.endpoint = self.endpoint.with_handler(verb, handler);
        self
    }
}

impl<M: Model> GenericResource<M> for ResourceView<M> {
    fn descriptor(&self) -> &ResourceDescriptor<M> {
        &self.descriptor
    }
}

impl<M: Model> Resource for ResourceView<M> {
    fn name(&self) -> &str {
        self.descriptor.name()
    }

    fn endpoint(self: Arc<Self>, namespace: &Namespace) -> Result<Endpoint, ContractError> {
        self.document(namespace, self.endpoint.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{ApiError, ApiErrorKind, ApiOperation, Reply};
    use crate::permissions::{permission_class, Claims, HasRole};
    use crate::repository::InMemoryStore;
    use crate::schema::JsonSchema;
    use crate::testing::Widget;
    use http::Method;
    use serde_json::json;

    fn count_view(store: &InMemoryStore<Widget>) -> ResourceView<Widget> {
        let descriptor =
            ResourceDescriptor::new("widgets", JsonSchema::<Widget>::new("WidgetSchema"))
                .with_model(store.clone())
                .with_permission(permission_class(|| HasRole::new("admin")));

        ResourceView::new(descriptor).on(Verb::Get, |descriptor, _ctx| async move {
            let count = descriptor
                .queryset()
                .map_err(|e| ApiError::from_contract(ApiOperation::List, e))?
                .count()
                .await
                .map_err(|e| ApiError::from_repository(ApiOperation::List, e))?;
            Ok::<_, ApiError>(Reply::ok(json!({ "count": count })))
        })
    }

    #[tokio::test]
    async fn test_view_receives_descriptor_permissions() {
        let store = InMemoryStore::new();
        store.insert(Widget::named("a")).await.unwrap();

        let mut ns = Namespace::new("widgets");
        ns.add_resource("/count", count_view(&store)).unwrap();
        let handler = ns
            .endpoint("/widgets/count")
            .and_then(|e| e.handler(Verb::Get))
            .unwrap();
        assert_eq!(handler.identity().name, "widgets.get");

        let anonymous = RequestContext::new(Method::GET, "/widgets/count".parse().unwrap());
        let err = handler.call(anonymous).await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Unauthorized);

        let admin = RequestContext::new(Method::GET, "/widgets/count".parse().unwrap())
            .with_extension(Claims::new("u1").with_role("admin"));
        let reply = handler.call(admin).await.unwrap();
        assert_eq!(reply.body, json!({"count": 1}));
    }

    #[test]
    fn test_view_without_model_reports_missing_model() {
        let view = ResourceView::new(ResourceDescriptor::<Widget>::new(
            "widgets",
            JsonSchema::<Widget>::new("WidgetSchema"),
        ));
        assert!(matches!(
            view.get_queryset(),
            Err(ContractError::MissingModel { .. })
        ));
    }
}
