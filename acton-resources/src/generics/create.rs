//! Create capability: validate, construct, persist and serialize one entity

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use serde_json::{Map, Value};

use super::base::{GenericResource, ResourceDescriptor};
use super::settings::{HandlerSettings, ParameterSpec, ResponseSpec};
use crate::error::ContractError;
use crate::handlers::{
    apply, ApiError, ApiOperation, Decorator, Handler, HandlerIdentity, HandlerResult, Reply,
    RequestContext, ValidationErrors,
};
use crate::namespace::{Endpoint, Namespace, Resource, Verb};
use crate::parameters::ParameterLocation;
use crate::repository::{Model, RepositoryErrorKind};

/// POST on a collection
#[async_trait]
pub trait CreateCapability<M: Model>: GenericResource<M> {
    /// Construct an entity from the request's arguments and persist it
    ///
    /// Arguments come from the validated args slot, else from the JSON body.
    /// The entity is added inside one unit of work; a uniqueness conflict
    /// answers 409 with the store's message and nothing is persisted.
    async fn create(&self, mut ctx: RequestContext) -> Result<M, ApiError> {
        let store = self
            .descriptor()
            .model()
            .map_err(|e| ApiError::from_contract(ApiOperation::Create, e))?;

        let raw = ctx
            .take_args()
            .or_else(|| ctx.body().cloned())
            .unwrap_or_else(|| Value::Object(Map::new()));
        let args: M::Args = serde_json::from_value(raw).map_err(|e| {
            ApiError::validation_failed(
                ApiOperation::Create,
                ValidationErrors::new().with("_schema", e.to_string()),
            )
        })?;

        let mut unit = store
            .begin()
            .await
            .map_err(|e| ApiError::from_repository(ApiOperation::Create, e))?;
        unit.add(M::from_args(args));

        let mut persisted = match unit.commit().await {
            Ok(persisted) => persisted,
            Err(e) => {
                if e.kind == RepositoryErrorKind::Integrity {
                    tracing::info!(
                        resource = %self.descriptor().name(),
                        model = M::NAME,
                        error = %e.message,
                        "Create rejected by uniqueness constraint"
                    );
                }
                return Err(ApiError::from_repository(ApiOperation::Create, e));
            }
        };

        persisted
            .pop()
            .ok_or_else(|| ApiError::internal(ApiOperation::Create, "Commit returned no entity"))
    }

    /// Create, then serialize the persisted entity
    async fn post(&self, ctx: RequestContext) -> HandlerResult {
        let entity = self.create(ctx).await?;
        let dumped = self.get_schema().dump_one(&entity);
        if !dumped.errors.is_empty() {
            return Err(ApiError::validation_failed(ApiOperation::Create, dumped.errors));
        }
        Ok(Reply::ok(dumped.data))
    }

    /// Responses, parameter validator and permissions of `POST`
    fn post_method_settings(&self) -> HandlerSettings {
        HandlerSettings {
            response_schemas: vec![
                ResponseSpec::status(StatusCode::BAD_REQUEST),
                ResponseSpec::with_schema(StatusCode::OK, self.get_schema().name(), false),
            ],
            parameters: self.get_parameters().map(|validator| ParameterSpec {
                validator,
                location: ParameterLocation::Json,
            }),
            permissions: self.descriptor().permissions(),
        }
    }

    /// Decorators wrapping `post`
    fn post_method_decorators(&self, namespace: &Namespace) -> Vec<Decorator> {
        self.post_method_settings().decorators(namespace)
    }

    /// The composed `POST` handler
    fn create_handler(self: Arc<Self>, namespace: &Namespace) -> Handler
    where
        Self: Sized,
    {
        let decorators = self.post_method_decorators(namespace);
        let identity = HandlerIdentity::new(format!("{}.create", self.descriptor().name()), &["args"]);
        let target = Handler::new(identity, move |ctx| {
            let resource = Arc::clone(&self);
            async move { resource.post(ctx).await }
        });
        apply(&decorators, target)
    }
}

/// Resource answering `POST` by creating one entity
#[derive(Debug, Clone)]
pub struct CreateResource<M: Model> {
    descriptor: ResourceDescriptor<M>,
}

impl<M: Model> CreateResource<M> {
    /// Check the descriptor and build the resource
    pub fn new(descriptor: ResourceDescriptor<M>) -> Result<Self, ContractError> {
        descriptor.model()?;
        Ok(Self { descriptor })
    }
}

impl<M: Model> GenericResource<M> for CreateResource<M> {
    fn descriptor(&self) -> &ResourceDescriptor<M> {
        &self.descriptor
    }
}

impl<M: Model> CreateCapability<M> for CreateResource<M> {}

impl<M: Model> Resource for CreateResource<M> {
    fn name(&self) -> &str {
        self.descriptor.name()
    }

    fn endpoint(self: Arc<Self>, namespace: &Namespace) -> Result<Endpoint, ContractError> {
        Ok(Endpoint::new()
            .with_handler(Verb::Post, self.create_handler(namespace))
            .with_permissions_applied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::ApiErrorKind;
    use crate::parameters::{ParameterField, SerdeParameters};
    use crate::permissions::{permission_class, DenyAll};
    use crate::repository::{InMemoryStore, ModelStore};
    use crate::schema::JsonSchema;
    use crate::testing::Widget;
    use http::Method;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    fn post(body: Value) -> RequestContext {
        RequestContext::new(Method::POST, "/widgets".parse().unwrap()).with_body(body)
    }

    fn resource(store: &InMemoryStore<Widget>) -> CreateResource<Widget> {
        CreateResource::new(
            ResourceDescriptor::new("widgets", JsonSchema::<Widget>::new("WidgetSchema"))
                .with_model(store.clone()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_persists_entity() {
        let store = InMemoryStore::new();
        let resource = resource(&store);

        let created = resource.create(post(json!({"name": "foo"}))).await.unwrap();
        assert_eq!(created, Widget::stored(1, "foo"));

        let visible = store.query().all().await.unwrap();
        assert_eq!(visible, vec![Widget::stored(1, "foo")]);
    }

    #[tokio::test]
    async fn test_duplicate_is_conflict_and_not_persisted() {
        let store = InMemoryStore::new();
        let resource = resource(&store);
        resource.post(post(json!({"name": "foo"}))).await.unwrap();

        let err = resource.post(post(json!({"name": "foo"}))).await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Conflict);
        assert!(err.message.contains("UNIQUE constraint failed: widget.name"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_body_is_bad_request() {
        let store = InMemoryStore::new();
        let resource = resource(&store);

        let err = resource.post(post(json!({"title": "foo"}))).await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::ValidationFailed);
        assert!(err.errors.as_ref().and_then(|e| e.get("_schema")).is_some());
        assert_eq!(store.access_count(), 0);
    }

    #[tokio::test]
    async fn test_parameters_validate_body_before_create() {
        #[derive(Serialize, Deserialize)]
        struct NewWidget {
            name: String,
        }

        let store = InMemoryStore::new();
        let resource = Arc::new(
            CreateResource::new(
                ResourceDescriptor::new("widgets", JsonSchema::<Widget>::new("WidgetSchema"))
                    .with_model(store.clone())
                    .with_parameters(
                        SerdeParameters::<NewWidget>::new("NewWidgetParameters")
                            .field(ParameterField::new("name", "string").required())
                            .check(|p| {
                                if p.name.is_empty() {
                                    Err(ValidationErrors::new().with("name", "Must not be empty."))
                                } else {
                                    Ok(())
                                }
                            }),
                    ),
            )
            .unwrap(),
        );
        let handler = resource.create_handler(&Namespace::new("widgets"));
        assert_eq!(
            handler.doc().parameters.as_ref().map(|p| p.location),
            Some(ParameterLocation::Json)
        );

        let err = handler.call(post(json!({"name": ""}))).await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::ValidationFailed);
        assert_eq!(store.access_count(), 0);

        let reply = handler.call(post(json!({"name": "bar"}))).await.unwrap();
        assert_eq!(reply.body, json!({"id": 1, "name": "bar"}));
    }

    #[tokio::test]
    async fn test_denied_create_never_touches_storage() {
        let store = InMemoryStore::new();
        let resource = Arc::new(
            CreateResource::new(
                ResourceDescriptor::new("widgets", JsonSchema::<Widget>::new("WidgetSchema"))
                    .with_model(store.clone())
                    .with_permission(permission_class(|| DenyAll)),
            )
            .unwrap(),
        );
        let handler = resource.create_handler(&Namespace::new("widgets"));

        let err = handler.call(post(json!({"name": "foo"}))).await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Forbidden);
        assert_eq!(store.access_count(), 0);
    }

    #[test]
    fn test_settings_document_singular_schema() {
        let store = InMemoryStore::new();
        let settings = resource(&store).post_method_settings();
        let codes: Vec<u16> = settings.response_schemas.iter().map(|r| r.code.as_u16()).collect();
        assert_eq!(codes, vec![400, 200]);
        assert!(!settings.response_schemas[1].many);
        assert!(settings.parameters.is_none());
        assert!(settings.permissions.is_empty());
    }
}
