//! Per-verb handler metadata

use std::fmt;
use std::sync::Arc;

use http::StatusCode;

use crate::handlers::Decorator;
use crate::namespace::Namespace;
use crate::parameters::{ParameterLocation, ParameterValidator};
use crate::permissions::Permission;

/// One declared response shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSpec {
    /// Status code
    pub code: StatusCode,
    /// Schema name of the body, if any
    pub schema: Option<String>,
    /// Whether the body is a list of `schema`
    pub many: bool,
}

impl ResponseSpec {
    /// Response without a body schema
    pub fn status(code: StatusCode) -> Self {
        Self {
            code,
            schema: None,
            many: false,
        }
    }

    /// Response with a body schema
    pub fn with_schema(code: StatusCode, schema: impl Into<String>, many: bool) -> Self {
        Self {
            code,
            schema: Some(schema.into()),
            many,
        }
    }
}

/// The single parameter validator of a handler
#[derive(Clone)]
pub struct ParameterSpec {
    /// Validator
    pub validator: Arc<dyn ParameterValidator>,
    /// Where its raw input comes from
    pub location: ParameterLocation,
}

impl fmt::Debug for ParameterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterSpec")
            .field("validator", &self.validator.name())
            .field("location", &self.location)
            .finish()
    }
}

/// Everything a handler declares: responses, at most one validator, permissions
///
/// Settings are computed once when a resource builds its handlers and then
/// turned into a decorator list with [`HandlerSettings::decorators`].
#[derive(Clone, Default)]
pub struct HandlerSettings {
    /// Declared responses
    pub response_schemas: Vec<ResponseSpec>,
    /// Parameter validator
    pub parameters: Option<ParameterSpec>,
    /// Permission checks in the order they run
    pub permissions: Vec<Arc<dyn Permission>>,
}

impl fmt::Debug for HandlerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let permissions: Vec<String> = self.permissions.iter().map(|p| p.name()).collect();
        f.debug_struct("HandlerSettings")
            .field("response_schemas", &self.response_schemas)
            .field("parameters", &self.parameters)
            .field("permissions", &permissions)
            .finish()
    }
}

impl HandlerSettings {
    /// Decorators in order: responses, then parameters, then permissions
    pub fn decorators(&self, namespace: &Namespace) -> Vec<Decorator> {
        let mut decorators: Vec<Decorator> = self
            .response_schemas
            .iter()
            .map(|response| namespace.response(response.code, response.schema.clone(), response.many))
            .collect();

        if let Some(parameters) = &self.parameters {
            decorators.push(namespace.parameters(Arc::clone(&parameters.validator), parameters.location));
        }

        decorators.extend(
            self.permissions
                .iter()
                .map(|permission| namespace.permission_required(Arc::clone(permission))),
        );

        decorators
    }
}
