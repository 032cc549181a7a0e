//! Handler documentation read back from composed handlers
//!
//! Every decorator that affects what an endpoint accepts or returns also
//! records it in the handler's [`EndpointDoc`]. Documentation is therefore
//! produced by reading handlers, never by calling them.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::parameters::{ParameterField, ParameterLocation};

/// One declared response shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseDoc {
    /// Status description
    pub description: String,
    /// Schema name, if the response has a body schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Whether the body is a list of `schema`
    pub many: bool,
}

/// The parameter validator attached to a handler
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParametersDoc {
    /// Validator name
    pub name: String,
    /// Where the raw input comes from
    pub location: ParameterLocation,
    /// Accepted fields
    pub fields: Vec<ParameterField>,
}

/// Everything declared about one verb handler
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EndpointDoc {
    /// Responses keyed by status code
    pub responses: BTreeMap<u16, ResponseDoc>,
    /// Parameter validator, at most one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ParametersDoc>,
    /// Permission checks in the order they run
    pub permissions: Vec<String>,
}

/// One verb on one path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationDoc {
    /// HTTP method
    pub method: String,
    /// Handler name
    pub handler: String,
    /// Declared handler signature
    pub signature: Vec<String>,
    /// Declared metadata
    #[serde(flatten)]
    pub doc: EndpointDoc,
}

/// Documentation for a whole namespace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiDocumentation {
    /// Namespace name
    pub namespace: String,
    /// Namespace description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Operations keyed by full path
    pub paths: BTreeMap<String, Vec<OperationDoc>>,
}

impl ApiDocumentation {
    /// Look up the operation for `method` on `path`
    pub fn operation(&self, path: &str, method: &str) -> Option<&OperationDoc> {
        self.paths
            .get(path)
            .and_then(|ops| ops.iter().find(|op| op.method.eq_ignore_ascii_case(method)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_doc_flattens() {
        let mut doc = EndpointDoc::default();
        doc.responses.insert(
            200,
            ResponseDoc {
                description: "OK".to_string(),
                schema: Some("WidgetSchema".to_string()),
                many: true,
            },
        );
        doc.permissions.push("Authenticated".to_string());

        let op = OperationDoc {
            method: "GET".to_string(),
            handler: "widgets.list".to_string(),
            signature: vec!["pagination_args".to_string()],
            doc,
        };
        let value = serde_json::to_value(&op).unwrap();

        assert_eq!(value["responses"]["200"]["schema"], json!("WidgetSchema"));
        assert_eq!(value["permissions"], json!(["Authenticated"]));
        assert!(value.get("parameters").is_none());
    }

    #[test]
    fn test_operation_lookup_ignores_case() {
        let mut paths = BTreeMap::new();
        paths.insert(
            "/widgets".to_string(),
            vec![OperationDoc {
                method: "POST".to_string(),
                handler: "widgets.create".to_string(),
                signature: vec![],
                doc: EndpointDoc::default(),
            }],
        );
        let docs = ApiDocumentation {
            namespace: "widgets".to_string(),
            description: None,
            paths,
        };
        assert!(docs.operation("/widgets", "post").is_some());
        assert!(docs.operation("/widgets", "get").is_none());
    }
}
