//! OpenAPI documentation for namespaces
//!
//! Converts the [`ApiDocumentation`] read from a namespace's composed handlers
//! into a utoipa OpenAPI document and serves it through Swagger UI. Nothing
//! here executes a handler.
//!
//! ## Example
//!
//! ```rust,ignore
//! use acton_resources::openapi::{OpenApiBuilder, SwaggerUI};
//!
//! let openapi = OpenApiBuilder::from_documentation(&ns.documentation())
//!     .title("Widget API")
//!     .version("1.0.0")
//!     .build();
//!
//! let app = ns.router().merge(SwaggerUI::with_spec("/swagger-ui", openapi));
//! ```

use axum::Router;
use utoipa::openapi::path::{
    HttpMethod, OperationBuilder, ParameterBuilder, ParameterIn, PathItemBuilder,
};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::schema::{ObjectBuilder, Schema, Type};
use utoipa::openapi::{
    ContentBuilder, InfoBuilder, PathsBuilder, RefOr, Required, ResponseBuilder,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::{ApiDocumentation, OperationDoc, ResponseDoc};
use crate::parameters::{ParameterField, ParameterLocation};

/// Builder for creating OpenAPI documentation with Swagger UI
pub struct OpenApiBuilder {
    openapi: utoipa::openapi::OpenApi,
}

impl OpenApiBuilder {
    /// Create a new OpenAPI builder from an existing OpenApi instance
    pub fn new(openapi: utoipa::openapi::OpenApi) -> Self {
        Self { openapi }
    }

    /// Describe every operation of a namespace
    pub fn from_documentation(docs: &ApiDocumentation) -> Self {
        let mut paths = PathsBuilder::new();
        for (path, operations) in &docs.paths {
            let mut item = PathItemBuilder::new();
            for operation in operations {
                if let Some(method) = http_method(&operation.method) {
                    item = item.operation(method, build_operation(&docs.namespace, path, operation));
                }
            }
            paths = paths.path(path.clone(), item.build());
        }

        let openapi = utoipa::openapi::OpenApiBuilder::new()
            .info(
                InfoBuilder::new()
                    .title(docs.namespace.clone())
                    .version(env!("CARGO_PKG_VERSION"))
                    .description(docs.description.clone())
                    .build(),
            )
            .paths(paths.build())
            .build();

        Self { openapi }
    }

    /// Set the API title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.openapi.info.title = title.into();
        self
    }

    /// Set the API version
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.openapi.info.version = version.into();
        self
    }

    /// Set the API description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.openapi.info.description = Some(description.into());
        self
    }

    /// Add a server URL
    pub fn server(mut self, url: impl Into<String>, description: Option<String>) -> Self {
        use utoipa::openapi::ServerBuilder;
        let mut builder = ServerBuilder::new().url(url.into());
        if let Some(desc) = description {
            builder = builder.description(Some(desc));
        }
        self.openapi
            .servers
            .get_or_insert_with(Vec::new)
            .push(builder.build());
        self
    }

    /// Build the final OpenAPI specification
    pub fn build(self) -> utoipa::openapi::OpenApi {
        self.openapi
    }
}

/// Swagger UI integration for OpenAPI documentation
pub struct SwaggerUI;

impl SwaggerUI {
    /// Create a Swagger UI router serving `openapi` at `/api-docs/openapi.json`
    pub fn with_spec(path: &'static str, openapi: utoipa::openapi::OpenApi) -> Router {
        SwaggerUi::new(path).url("/api-docs/openapi.json", openapi).into()
    }
}

fn http_method(method: &str) -> Option<HttpMethod> {
    match method {
        "GET" => Some(HttpMethod::Get),
        "POST" => Some(HttpMethod::Post),
        "PUT" => Some(HttpMethod::Put),
        "PATCH" => Some(HttpMethod::Patch),
        "DELETE" => Some(HttpMethod::Delete),
        _ => None,
    }
}

fn build_operation(namespace: &str, path: &str, op: &OperationDoc) -> utoipa::openapi::path::Operation {
    let mut builder = OperationBuilder::new()
        .operation_id(Some(op.handler.clone()))
        .summary(Some(op.handler.clone()))
        .tags(Some(vec![namespace.to_string()]));

    if !op.doc.permissions.is_empty() {
        builder = builder.description(Some(format!(
            "Requires: {}",
            op.doc.permissions.join(", ")
        )));
    }

    for name in path_parameters(path) {
        builder = builder.parameter(
            ParameterBuilder::new()
                .name(name)
                .parameter_in(ParameterIn::Path)
                .required(Required::True)
                .schema(Some(field_schema("string"))),
        );
    }

    if let Some(parameters) = &op.doc.parameters {
        match parameters.location {
            ParameterLocation::Query => {
                for field in &parameters.fields {
                    builder = builder.parameter(
                        ParameterBuilder::new()
                            .name(field.name.clone())
                            .parameter_in(ParameterIn::Query)
                            .required(if field.required { Required::True } else { Required::False })
                            .description(field.description.clone())
                            .schema(Some(field_schema(&field.kind))),
                    );
                }
            }
            ParameterLocation::Json => {
                builder = builder.request_body(Some(
                    RequestBodyBuilder::new()
                        .description(Some(parameters.name.clone()))
                        .content(
                            "application/json",
                            ContentBuilder::new()
                                .schema(Some(body_schema(&parameters.fields)))
                                .build(),
                        )
                        .required(Some(Required::True))
                        .build(),
                ));
            }
        }
    }

    for (code, response) in &op.doc.responses {
        builder = builder.response(
            code.to_string(),
            ResponseBuilder::new()
                .description(response_description(response))
                .build(),
        );
    }

    builder.build()
}

fn path_parameters(path: &str) -> Vec<String> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
        .map(|name| name.trim_start_matches('*').to_string())
        .collect()
}

fn response_description(response: &ResponseDoc) -> String {
    match (&response.schema, response.many) {
        (Some(schema), true) => format!("{}: list of {}", response.description, schema),
        (Some(schema), false) => format!("{}: {}", response.description, schema),
        (None, _) => response.description.clone(),
    }
}

fn schema_type(kind: &str) -> Type {
    match kind {
        "integer" => Type::Integer,
        "number" => Type::Number,
        "boolean" => Type::Boolean,
        "array" => Type::Array,
        "object" => Type::Object,
        _ => Type::String,
    }
}

fn field_schema(kind: &str) -> RefOr<Schema> {
    RefOr::T(Schema::Object(
        ObjectBuilder::new().schema_type(schema_type(kind)).build(),
    ))
}

fn body_schema(fields: &[ParameterField]) -> RefOr<Schema> {
    let mut object = ObjectBuilder::new().schema_type(Type::Object);
    for field in fields {
        object = object.property(field.name.clone(), field_schema(&field.kind));
        if field.required {
            object = object.required(field.name.clone());
        }
    }
    RefOr::T(Schema::Object(object.build()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generics::{ListCreateResource, ResourceDescriptor};
    use crate::namespace::Namespace;
    use crate::parameters::{PaginationParameters, SerdeParameters};
    use crate::repository::InMemoryStore;
    use crate::schema::JsonSchema;
    use crate::testing::Widget;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct NewWidget {
        name: String,
    }

    fn documentation() -> ApiDocumentation {
        let mut ns = Namespace::new("widgets").with_description("Widget catalogue");
        ns.add_resource(
            "/",
            ListCreateResource::new(
                ResourceDescriptor::new("widgets", JsonSchema::<Widget>::new("WidgetSchema"))
                    .with_model(InMemoryStore::<Widget>::new())
                    .with_pagination(PaginationParameters::new())
                    .with_parameters(
                        SerdeParameters::<NewWidget>::new("NewWidget")
                            .field(ParameterField::new("name", "string").required()),
                    ),
            )
            .unwrap(),
        )
        .unwrap();
        ns.documentation()
    }

    #[test]
    fn test_openapi_from_documentation() {
        let openapi = OpenApiBuilder::from_documentation(&documentation())
            .title("Widget API")
            .server("https://api.example.com", Some("Production".to_string()))
            .build();

        assert_eq!(openapi.info.title, "Widget API");
        assert_eq!(openapi.info.description.as_deref(), Some("Widget catalogue"));
        assert!(openapi.servers.is_some());

        let item = openapi.paths.paths.get("/widgets").unwrap();
        let get = item.get.as_ref().unwrap();
        assert_eq!(get.operation_id.as_deref(), Some("widgets.list"));
        assert_eq!(get.parameters.as_ref().map(Vec::len), Some(2));
        assert!(get.responses.responses.contains_key("400"));

        let post = item.post.as_ref().unwrap();
        assert!(post.request_body.is_some());
    }

    #[test]
    fn test_path_parameters() {
        assert_eq!(path_parameters("/widgets/{id}/parts/{part}"), vec!["id", "part"]);
        assert!(path_parameters("/widgets").is_empty());
    }
}
