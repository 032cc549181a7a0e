//! Per-path verb handlers

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use axum::routing::MethodFilter;
use http::Method;

use super::Namespace;
use crate::error::ContractError;
use crate::handlers::Handler;

/// HTTP verbs a resource can answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verb {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl Verb {
    /// Upper-case method name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Routing filter for this verb
    pub fn method_filter(&self) -> MethodFilter {
        match self {
            Self::Get => MethodFilter::GET,
            Self::Post => MethodFilter::POST,
            Self::Put => MethodFilter::PUT,
            Self::Patch => MethodFilter::PATCH,
            Self::Delete => MethodFilter::DELETE,
        }
    }

    /// Verb for an HTTP method, if supported
    pub fn from_method(method: &Method) -> Option<Self> {
        [Self::Get, Self::Post, Self::Put, Self::Patch, Self::Delete]
            .into_iter()
            .find(|verb| verb.as_str() == method.as_str())
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The composed verb handlers of one resource
///
/// Endpoints are values: once built they are registered with a namespace
/// and never modified in place.
#[derive(Debug, Clone, Default)]
pub struct Endpoint {
    handlers: BTreeMap<Verb, Handler>,
    permissions_applied: bool,
}

impl Endpoint {
    /// Endpoint with no handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the handler for `verb`
    #[must_use]
    pub fn with_handler(mut self, verb: Verb, handler: Handler) -> Self {
        self.handlers.insert(verb, handler);
        self
    }

    /// Record that every verb already received its permission checks
    #[must_use]
    pub fn with_permissions_applied(mut self) -> Self {
        self.permissions_applied = true;
        self
    }

    /// Whether permission checks were already applied to every verb
    pub fn permissions_applied(&self) -> bool {
        self.permissions_applied
    }

    /// Handler for `verb`
    pub fn handler(&self, verb: Verb) -> Option<&Handler> {
        self.handlers.get(&verb)
    }

    /// Handlers in verb order
    pub fn handlers(&self) -> impl Iterator<Item = (Verb, &Handler)> {
        self.handlers.iter().map(|(verb, handler)| (*verb, handler))
    }

    /// Verbs with a handler
    pub fn verbs(&self) -> Vec<Verb> {
        self.handlers.keys().copied().collect()
    }

    /// Whether no verb has a handler
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Transform every handler
    #[must_use]
    pub fn map_handlers<F>(self, f: F) -> Self
    where
        F: Fn(Handler) -> Handler,
    {
        Self {
            handlers: self
                .handlers
                .into_iter()
                .map(|(verb, handler)| (verb, f(handler)))
                .collect(),
            permissions_applied: self.permissions_applied,
        }
    }
}

/// Something a namespace can register under a route
pub trait Resource: Send + Sync + 'static {
    /// Resource name, used in handler names and errors
    fn name(&self) -> &str;

    /// Build the composed endpoint
    fn endpoint(self: Arc<Self>, namespace: &Namespace) -> Result<Endpoint, ContractError>;
}
