//! List capability: fetch, paginate and serialize a collection

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use serde_json::Value;

use super::base::{GenericResource, ResourceDescriptor};
use super::settings::{HandlerSettings, ParameterSpec, ResponseSpec};
use crate::error::ContractError;
use crate::handlers::{
    apply, ApiError, ApiOperation, Decorator, Handler, HandlerIdentity, HandlerResult, Reply,
    RequestContext,
};
use crate::namespace::{Endpoint, Namespace, Resource, Verb};
use crate::parameters::ParameterLocation;
use crate::repository::{FilterCondition, Model, Pagination};

/// GET on a collection
#[async_trait]
pub trait ListCapability<M: Model>: GenericResource<M> {
    /// Serialize the (possibly paginated) collection
    ///
    /// Route path parameters become equality filters. Pagination arguments
    /// are read from the context's validated args, falling back to
    /// validating the query string when no validator ran ahead of this call.
    async fn list(&self, ctx: RequestContext) -> HandlerResult {
        let schema = self.get_schema();
        let mut queryset = self
            .get_queryset()
            .map_err(|e| ApiError::from_contract(ApiOperation::List, e))?;

        for (field, value) in ctx.path_params() {
            queryset = queryset.filter(FilterCondition::eq(field.as_str(), value.as_str()));
        }

        if let Some(pagination) = self.pagination_args(&ctx)? {
            queryset = queryset.paginate(pagination);
        }

        let collection = queryset
            .all()
            .await
            .map_err(|e| ApiError::from_repository(ApiOperation::List, e))?;

        let dumped = schema.dump_many(&collection);
        if !dumped.errors.is_empty() {
            return Err(ApiError::validation_failed(ApiOperation::List, dumped.errors));
        }
        Ok(Reply::ok(dumped.data))
    }

    /// Offset and limit for this request, if a pagination class is declared
    fn pagination_args(&self, ctx: &RequestContext) -> Result<Option<Pagination>, ApiError> {
        let Some(validator) = self.descriptor().pagination_class() else {
            return Ok(None);
        };

        let args = match ctx.args() {
            Some(args) => args.clone(),
            None => validator
                .validate(ctx.query())
                .map_err(|errors| ApiError::validation_failed(ApiOperation::List, errors))?,
        };

        match (
            args.get("offset").and_then(Value::as_u64),
            args.get("limit").and_then(Value::as_u64),
        ) {
            (Some(offset), Some(limit)) => Ok(Some(Pagination::new(offset, limit))),
            _ => Err(ApiError::from_contract(
                ApiOperation::List,
                ContractError::InvalidPagination {
                    resource: self.descriptor().name().to_string(),
                    validator: validator.name().to_string(),
                },
            )),
        }
    }

    /// Responses, the single parameter validator and permissions of `GET`
    ///
    /// The pagination class takes precedence over declared parameters.
    fn get_method_input_output_settings(&self) -> HandlerSettings {
        let descriptor = self.descriptor();
        let parameters = descriptor
            .pagination_class()
            .or_else(|| descriptor.parameters())
            .map(|validator| ParameterSpec {
                validator: Arc::clone(validator),
                location: ParameterLocation::Query,
            });

        HandlerSettings {
            response_schemas: vec![
                ResponseSpec::status(StatusCode::BAD_REQUEST),
                ResponseSpec::with_schema(StatusCode::OK, self.get_schema().name(), true),
            ],
            parameters,
            permissions: descriptor.permissions(),
        }
    }

    /// Decorators wrapping `list`
    fn get_method_decorators(&self, namespace: &Namespace) -> Vec<Decorator> {
        self.get_method_input_output_settings().decorators(namespace)
    }

    /// The composed `GET` handler
    fn list_handler(self: Arc<Self>, namespace: &Namespace) -> Handler
    where
        Self: Sized,
    {
        let decorators = self.get_method_decorators(namespace);
        let identity = HandlerIdentity::new(
            format!("{}.list", self.descriptor().name()),
            &["pagination_args", "filters"],
        );
        let target = Handler::new(identity, move |ctx| {
            let resource = Arc::clone(&self);
            async move { resource.list(ctx).await }
        });
        apply(&decorators, target)
    }
}

/// Resource answering `GET` with a list
#[derive(Debug, Clone)]
pub struct ListResource<M: Model> {
    descriptor: ResourceDescriptor<M>,
}

impl<M: Model> ListResource<M> {
    /// Check the descriptor and build the resource
    ///
    /// Fails when no collection is available or the pagination class does
    /// not produce a window.
    pub fn new(descriptor: ResourceDescriptor<M>) -> Result<Self, ContractError> {
        descriptor.queryset()?;
        descriptor.validate_pagination()?;
        Ok(Self { descriptor })
    }
}

impl<M: Model> GenericResource<M> for ListResource<M> {
    fn descriptor(&self) -> &ResourceDescriptor<M> {
        &self.descriptor
    }
}

impl<M: Model> ListCapability<M> for ListResource<M> {}

impl<M: Model> Resource for ListResource<M> {
    fn name(&self) -> &str {
        self.descriptor.name()
    }

    fn endpoint(self: Arc<Self>, namespace: &Namespace) -> Result<Endpoint, ContractError> {
        Ok(Endpoint::new()
            .with_handler(Verb::Get, self.list_handler(namespace))
            .with_permissions_applied())
    }
}
