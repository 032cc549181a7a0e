//! Composable request handlers
//!
//! This module provides the runtime half of generic resources:
//!
//! - [`Handler`] / [`Decorator`] / [`apply`]: decorator-chain composition
//! - [`RequestContext`]: request-scoped input, including validated arguments
//! - [`Reply`]: status plus JSON body
//! - [`ApiError`]: every recognized failure, with its HTTP status
//!
//! Handlers are composed once at registration and then shared by every
//! request; nothing here recomposes per request.

mod chain;
mod context;
mod error;
mod response;

pub use chain::{apply, Decorator, Handler, HandlerIdentity, HandlerResult, Next};
pub use context::RequestContext;
pub use error::{ApiError, ApiErrorKind, ApiOperation, ValidationErrors};
pub use response::Reply;
