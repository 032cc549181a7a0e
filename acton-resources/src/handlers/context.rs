//! Request-scoped context handed to every composed handler
//!
//! A [`RequestContext`] is built once per request from the transport request
//! and lives exactly as long as the handler runs. Parameter validation writes
//! its output into [`RequestContext::args`]; the core reads it from there.

use std::collections::{BTreeMap, HashMap};

use axum::body::Body;
use axum::extract::{FromRequestParts, Query, RawPathParams};
use http::request::Parts;
use http::{Extensions, HeaderMap, Method, Uri};
use http_body_util::LengthLimitError;
use serde_json::{Map, Value};

use super::error::{ApiError, ApiErrorKind, ApiOperation};

/// Request-scoped handler input
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
    path_params: BTreeMap<String, String>,
    query: Map<String, Value>,
    body: Option<Value>,
    args: Option<Value>,
}

impl RequestContext {
    /// Create an empty context for `method` and `uri`
    ///
    /// Query parameters are parsed from `uri`; unparseable query strings
    /// yield an empty map.
    pub fn new(method: Method, uri: Uri) -> Self {
        let query = parse_query(&uri).unwrap_or_default();
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            extensions: Extensions::new(),
            path_params: BTreeMap::new(),
            query,
            body: None,
            args: None,
        }
    }

    /// Build a context from the head of a transport request
    ///
    /// Path parameters are captured here; the query string and body are left
    /// empty until [`RequestContext::read_input`] runs, so permission checks
    /// can reject a request without touching its input.
    pub async fn from_parts(mut parts: Parts) -> Self {
        let path_params = match RawPathParams::from_request_parts(&mut parts, &()).await {
            Ok(params) => params
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            Err(_) => BTreeMap::new(),
        };

        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            extensions: parts.extensions,
            path_params,
            query: Map::new(),
            body: None,
            args: None,
        }
    }

    /// Parse the query string and read at most `limit` body bytes as JSON
    ///
    /// An empty body leaves [`RequestContext::body`] unset.
    pub async fn read_input(&mut self, body: Body, limit: usize) -> Result<(), ApiError> {
        self.query = parse_query(&self.uri)
            .map_err(|message| ApiError::bad_request(ApiOperation::Dispatch, message))?;

        let bytes = axum::body::to_bytes(body, limit).await.map_err(|e| {
            if exceeded_length_limit(&e) {
                ApiError::new(
                    ApiOperation::Dispatch,
                    ApiErrorKind::PayloadTooLarge,
                    "Request body too large",
                )
            } else {
                ApiError::bad_request(ApiOperation::Dispatch, format!("Failed to read body: {}", e))
            }
        })?;

        if !bytes.is_empty() {
            let value = serde_json::from_slice(&bytes).map_err(|e| {
                ApiError::bad_request(ApiOperation::Dispatch, format!("Malformed JSON body: {}", e))
            })?;
            self.body = Some(value);
        }
        Ok(())
    }

    /// Attach a JSON body
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a path parameter
    #[must_use]
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    /// Attach a typed extension (for example authenticated claims)
    #[must_use]
    pub fn with_extension<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }

    /// Attach a header
    #[must_use]
    pub fn with_header(mut self, name: http::HeaderName, value: http::HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// HTTP method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request URI
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Request extensions
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Matched route parameters
    pub fn path_params(&self) -> &BTreeMap<String, String> {
        &self.path_params
    }

    /// Raw query parameters, values as JSON strings
    pub fn query(&self) -> &Map<String, Value> {
        &self.query
    }

    /// Raw JSON body
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Validated arguments, present once parameter validation ran
    pub fn args(&self) -> Option<&Value> {
        self.args.as_ref()
    }

    /// Store validated arguments
    pub fn set_args(&mut self, args: Value) {
        self.args = Some(args);
    }

    /// Take validated arguments out of the context
    pub fn take_args(&mut self) -> Option<Value> {
        self.args.take()
    }
}

fn parse_query(uri: &Uri) -> Result<Map<String, Value>, String> {
    if uri.query().is_none() {
        return Ok(Map::new());
    }
    let Query(pairs) =
        Query::<HashMap<String, String>>::try_from_uri(uri).map_err(|e| e.to_string())?;
    Ok(pairs
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect())
}

/// Whether a body read failed because the body outgrew its limit
///
/// The limit error may come from `to_bytes` itself or from a `Limited` body
/// installed by `RequestBodyLimitLayer`, wrapped in one or more `axum::Error`s.
fn exceeded_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(current) = source {
        if current.is::<LengthLimitError>() {
            return true;
        }
        source = current.source();
    }
    false
}
