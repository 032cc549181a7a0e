//! Resource descriptors and the capability surface shared by every resource

use std::fmt;
use std::sync::Arc;

use crate::error::ContractError;
use crate::handlers::{apply, Decorator};
use crate::namespace::{Endpoint, Namespace};
use crate::parameters::{produces_pagination, ParameterValidator};
use crate::permissions::{Permission, PermissionClass};
use crate::repository::{Model, ModelStore, Query};
use crate::schema::Schema;

type QuerysetFn<M> = Arc<dyn Fn() -> Query<M> + Send + Sync>;

/// Declarative description of a resource
///
/// Everything a generic resource needs to generate its handlers: where the
/// entities live, how they are serialized, which input is accepted, how lists
/// are paginated and who may call it.
///
/// # Example
///
/// ```rust,ignore
/// let descriptor = ResourceDescriptor::new("widgets", JsonSchema::<Widget>::new("WidgetSchema"))
///     .with_model(store.clone())
///     .with_pagination(PaginationParameters::new().with_default_limit(10))
///     .with_permission(permission_class(|| Authenticated));
/// ```
pub struct ResourceDescriptor<M: Model> {
    name: String,
    model: Option<Arc<dyn ModelStore<M>>>,
    queryset: Option<QuerysetFn<M>>,
    schema: Arc<dyn Schema<M>>,
    parameters: Option<Arc<dyn ParameterValidator>>,
    permission_classes: Vec<PermissionClass>,
    pagination_class: Option<Arc<dyn ParameterValidator>>,
}

impl<M: Model> Clone for ResourceDescriptor<M> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            model: self.model.clone(),
            queryset: self.queryset.clone(),
            schema: Arc::clone(&self.schema),
            parameters: self.parameters.clone(),
            permission_classes: self.permission_classes.clone(),
            pagination_class: self.pagination_class.clone(),
        }
    }
}

impl<M: Model> fmt::Debug for ResourceDescriptor<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("name", &self.name)
            .field("model", &M::NAME)
            .field("has_model", &self.model.is_some())
            .field("has_queryset", &self.queryset.is_some())
            .field("schema", &self.schema.name())
            .field("parameters", &self.parameters.as_ref().map(|p| p.name().to_string()))
            .field("permission_classes", &self.permission_classes.len())
            .field(
                "pagination_class",
                &self.pagination_class.as_ref().map(|p| p.name().to_string()),
            )
            .finish()
    }
}

impl<M: Model> ResourceDescriptor<M> {
    /// Descriptor with a schema and nothing else
    pub fn new(name: impl Into<String>, schema: impl Schema<M> + 'static) -> Self {
        Self {
            name: name.into(),
            model: None,
            queryset: None,
            schema: Arc::new(schema),
            parameters: None,
            permission_classes: Vec::new(),
            pagination_class: None,
        }
    }

    /// Store the entities live in
    #[must_use]
    pub fn with_model(mut self, store: impl ModelStore<M> + 'static) -> Self {
        self.model = Some(Arc::new(store));
        self
    }

    /// Replace the default `model.query()` collection
    #[must_use]
    pub fn with_queryset<F>(mut self, queryset: F) -> Self
    where
        F: Fn() -> Query<M> + Send + Sync + 'static,
    {
        self.queryset = Some(Arc::new(queryset));
        self
    }

    /// Input validator
    #[must_use]
    pub fn with_parameters(mut self, parameters: impl ParameterValidator + 'static) -> Self {
        self.parameters = Some(Arc::new(parameters));
        self
    }

    /// Append a permission class; checks run in the order they were added
    #[must_use]
    pub fn with_permission(mut self, class: PermissionClass) -> Self {
        self.permission_classes.push(class);
        self
    }

    /// Pagination validator for list handlers
    #[must_use]
    pub fn with_pagination(mut self, pagination: impl ParameterValidator + 'static) -> Self {
        self.pagination_class = Some(Arc::new(pagination));
        self
    }

    /// Resource name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared store
    pub fn model(&self) -> Result<&Arc<dyn ModelStore<M>>, ContractError> {
        self.model.as_ref().ok_or_else(|| self.missing_model())
    }

    /// Full collection: the override if one is declared, else the model's query
    pub fn queryset(&self) -> Result<Query<M>, ContractError> {
        if let Some(queryset) = &self.queryset {
            return Ok(queryset());
        }
        self.model().map(|store| store.query())
    }

    /// Declared schema
    pub fn schema(&self) -> &Arc<dyn Schema<M>> {
        &self.schema
    }

    /// Declared input validator
    pub fn parameters(&self) -> Option<&Arc<dyn ParameterValidator>> {
        self.parameters.as_ref()
    }

    /// Declared pagination validator
    pub fn pagination_class(&self) -> Option<&Arc<dyn ParameterValidator>> {
        self.pagination_class.as_ref()
    }

    /// Declared permission classes
    pub fn permission_classes(&self) -> &[PermissionClass] {
        &self.permission_classes
    }

    /// One fresh permission check per declared class
    pub fn permissions(&self) -> Vec<Arc<dyn Permission>> {
        self.permission_classes.iter().map(|class| class()).collect()
    }

    /// Reject pagination validators that do not produce `offset` and `limit`
    pub fn validate_pagination(&self) -> Result<(), ContractError> {
        match &self.pagination_class {
            Some(validator) if !produces_pagination(validator.as_ref()) => {
                Err(ContractError::InvalidPagination {
                    resource: self.name.clone(),
                    validator: validator.name().to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    fn missing_model(&self) -> ContractError {
        ContractError::MissingModel {
            resource: self.name.clone(),
        }
    }
}

/// Capability surface every generated resource exposes
pub trait GenericResource<M: Model>: Send + Sync + 'static {
    /// The resource's declaration
    fn descriptor(&self) -> &ResourceDescriptor<M>;

    /// Full collection of entities
    fn get_queryset(&self) -> Result<Query<M>, ContractError> {
        self.descriptor().queryset()
    }

    /// Declared schema, unmodified
    fn get_schema(&self) -> Arc<dyn Schema<M>> {
        Arc::clone(self.descriptor().schema())
    }

    /// Declared input validator
    fn get_parameters(&self) -> Option<Arc<dyn ParameterValidator>> {
        self.descriptor().parameters().cloned()
    }

    /// Apply one permission check per declared class to every verb of `endpoint`
    ///
    /// Fails if the endpoint's verbs already carry their permission checks,
    /// so checks are never stacked twice.
    fn document(&self, namespace: &Namespace, endpoint: Endpoint) -> Result<Endpoint, ContractError> {
        if endpoint.permissions_applied() {
            return Err(ContractError::PermissionsAlreadyApplied {
                resource: self.descriptor().name().to_string(),
            });
        }

        let decorators: Vec<Decorator> = self
            .descriptor()
            .permissions()
            .into_iter()
            .map(|permission| namespace.permission_required(permission))
            .collect();

        Ok(endpoint
            .map_handlers(|handler| apply(&decorators, handler))
            .with_permissions_applied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{Handler, HandlerIdentity, Reply, RequestContext};
    use crate::namespace::Verb;
    use crate::parameters::{ParameterField, SerdeParameters};
    use crate::permissions::{permission_class, AllowAny, DenyAll};
    use crate::repository::{FilterCondition, InMemoryStore};
    use crate::schema::JsonSchema;
    use crate::testing::Widget;
    use http::Method;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    struct Bare(ResourceDescriptor<Widget>);

    impl GenericResource<Widget> for Bare {
        fn descriptor(&self) -> &ResourceDescriptor<Widget> {
            &self.0
        }
    }

    fn descriptor() -> ResourceDescriptor<Widget> {
        ResourceDescriptor::new("widgets", JsonSchema::<Widget>::new("WidgetSchema"))
    }

    fn endpoint() -> Endpoint {
        let handler = Handler::new(HandlerIdentity::new("widgets.get", &[]), |_ctx| async {
            Ok(Reply::ok(json!([])))
        });
        Endpoint::new().with_handler(Verb::Get, handler)
    }

    #[test]
    fn test_missing_model_is_contract_error() {
        let resource = Bare(descriptor());
        assert_eq!(
            resource.get_queryset().unwrap_err(),
            ContractError::MissingModel {
                resource: "widgets".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_queryset_override_wins() {
        let store = InMemoryStore::<Widget>::new();
        store.insert(Widget::named("keep")).await.unwrap();
        store.insert(Widget::named("drop")).await.unwrap();

        let filtered = store.clone();
        let resource = Bare(descriptor().with_model(store.clone()).with_queryset(move || {
            filtered.query().filter(FilterCondition::eq("name", "keep"))
        }));

        let rows = resource.get_queryset().unwrap().all().await.unwrap();
        assert_eq!(rows, vec![Widget::stored(1, "keep")]);
    }

    #[test]
    fn test_pagination_must_produce_window() {
        #[derive(Serialize, Deserialize)]
        struct Cursor {
            after: Option<String>,
        }

        let descriptor = descriptor().with_pagination(
            SerdeParameters::<Cursor>::new("CursorParameters")
                .field(ParameterField::new("after", "string")),
        );
        assert_eq!(
            descriptor.validate_pagination().unwrap_err(),
            ContractError::InvalidPagination {
                resource: "widgets".to_string(),
                validator: "CursorParameters".to_string(),
            }
        );
    }

    #[test]
    fn test_permissions_instantiate_per_class() {
        let descriptor = descriptor()
            .with_permission(permission_class(|| AllowAny))
            .with_permission(permission_class(|| DenyAll));
        let names: Vec<String> = descriptor.permissions().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["AllowAny", "DenyAll"]);
    }

    #[tokio::test]
    async fn test_document_applies_permissions_once() {
        let ns = Namespace::new("widgets");
        let resource = Bare(descriptor().with_permission(permission_class(|| DenyAll)));

        let documented = resource.document(&ns, endpoint()).unwrap();
        assert!(documented.permissions_applied());

        let handler = documented.handler(Verb::Get).unwrap();
        assert_eq!(handler.guard_names(), vec!["DenyAll"]);
        let ctx = RequestContext::new(Method::GET, "/widgets".parse().unwrap());
        assert!(handler.call(ctx).await.is_err());

        assert_eq!(
            resource.document(&ns, documented).unwrap_err(),
            ContractError::PermissionsAlreadyApplied {
                resource: "widgets".to_string()
            }
        );
    }
}
