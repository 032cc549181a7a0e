//! Permission checks
//!
//! A [`Permission`] inspects the request context and either lets the request
//! through or rejects it with a [`PermissionDenied`] that carries its own
//! status (401 when nobody is authenticated, 403 when the caller lacks
//! something). Composed handlers run every permission before parameter
//! validation and before any storage access.
//!
//! Authentication itself happens upstream: a middleware validates the token
//! and inserts [`Claims`] into the request extensions.
//!
//! # Example
//!
//! ```rust
//! use acton_resources::handlers::RequestContext;
//! use acton_resources::permissions::{Claims, HasRole, Permission};
//! use http::Method;
//!
//! let claims = Claims::new("user:42").with_role("admin");
//! let ctx = RequestContext::new(Method::GET, "/widgets".parse().unwrap())
//!     .with_extension(claims);
//!
//! assert!(HasRole::new("admin").check(&ctx).is_ok());
//! assert!(HasRole::new("auditor").check(&ctx).is_err());
//! ```

use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::handlers::{ApiError, ApiErrorKind, ApiOperation, RequestContext};

/// Claims of the authenticated caller
///
/// Format-agnostic: whatever validated the token maps its claims here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID or client ID)
    pub sub: String,

    /// Username (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Roles
    #[serde(default)]
    pub roles: Vec<String>,

    /// Permissions
    #[serde(default)]
    pub perms: Vec<String>,
}

impl Claims {
    /// Claims for `sub` with no roles or permissions
    pub fn new(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            username: None,
            roles: Vec::new(),
            perms: Vec::new(),
        }
    }

    /// Add a role
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Add a permission
    #[must_use]
    pub fn with_permission(mut self, perm: impl Into<String>) -> Self {
        self.perms.push(perm.into());
        self
    }

    /// Check if the caller has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Check if the caller has a specific permission
    pub fn has_permission(&self, perm: &str) -> bool {
        self.perms.iter().any(|p| p == perm)
    }
}

/// Rejection produced by a permission check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionDenied {
    status: StatusCode,
    message: String,
}

impl PermissionDenied {
    /// 401: no authenticated caller
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    /// 403: caller lacks something
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }

    /// Response status
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Message shown to the caller
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for PermissionDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.status)
    }
}

impl std::error::Error for PermissionDenied {}

impl From<PermissionDenied> for ApiError {
    fn from(denied: PermissionDenied) -> Self {
        let kind = if denied.status == StatusCode::UNAUTHORIZED {
            ApiErrorKind::Unauthorized
        } else {
            ApiErrorKind::Forbidden
        };
        ApiError::new(ApiOperation::Authorize, kind, denied.message)
    }
}

/// A request-scoped authorization check
pub trait Permission: Send + Sync {
    /// Name used in documentation and logs
    fn name(&self) -> String;

    /// Allow or reject the request
    fn check(&self, ctx: &RequestContext) -> Result<(), PermissionDenied>;
}

/// Factory producing one permission check per handler
pub type PermissionClass = Arc<dyn Fn() -> Arc<dyn Permission> + Send + Sync>;

/// Wrap a constructor as a [`PermissionClass`]
pub fn permission_class<F, P>(factory: F) -> PermissionClass
where
    F: Fn() -> P + Send + Sync + 'static,
    P: Permission + 'static,
{
    Arc::new(move || Arc::new(factory()) as Arc<dyn Permission>)
}

fn claims(ctx: &RequestContext) -> Result<&Claims, PermissionDenied> {
    ctx.extensions()
        .get::<Claims>()
        .ok_or_else(|| PermissionDenied::unauthenticated("Authentication required"))
}

/// Lets every request through
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAny;

impl Permission for AllowAny {
    fn name(&self) -> String {
        "AllowAny".to_string()
    }

    fn check(&self, _ctx: &RequestContext) -> Result<(), PermissionDenied> {
        Ok(())
    }
}

/// Rejects every request with 403
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl Permission for DenyAll {
    fn name(&self) -> String {
        "DenyAll".to_string()
    }

    fn check(&self, _ctx: &RequestContext) -> Result<(), PermissionDenied> {
        Err(PermissionDenied::forbidden("Permission denied"))
    }
}

/// Requires authenticated claims
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

impl Permission for Authenticated {
    fn name(&self) -> String {
        "Authenticated".to_string()
    }

    fn check(&self, ctx: &RequestContext) -> Result<(), PermissionDenied> {
        claims(ctx).map(|_| ())
    }
}

/// Requires a role
#[derive(Debug, Clone)]
pub struct HasRole {
    role: String,
}

impl HasRole {
    /// Require `role`
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into() }
    }
}

impl Permission for HasRole {
    fn name(&self) -> String {
        format!("HasRole({})", self.role)
    }

    fn check(&self, ctx: &RequestContext) -> Result<(), PermissionDenied> {
        if claims(ctx)?.has_role(&self.role) {
            Ok(())
        } else {
            Err(PermissionDenied::forbidden(format!(
                "Role '{}' required",
                self.role
            )))
        }
    }
}

/// Requires a permission
#[derive(Debug, Clone)]
pub struct HasPermission {
    perm: String,
}

impl HasPermission {
    /// Require `perm`
    pub fn new(perm: impl Into<String>) -> Self {
        Self { perm: perm.into() }
    }
}

impl Permission for HasPermission {
    fn name(&self) -> String {
        format!("HasPermission({})", self.perm)
    }

    fn check(&self, ctx: &RequestContext) -> Result<(), PermissionDenied> {
        if claims(ctx)?.has_permission(&self.perm) {
            Ok(())
        } else {
            Err(PermissionDenied::forbidden(format!(
                "Permission '{}' required",
                self.perm
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn ctx() -> RequestContext {
        RequestContext::new(Method::GET, "/widgets".parse().unwrap())
    }

    #[test]
    fn test_authenticated_requires_claims() {
        let err = Authenticated.check(&ctx()).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let with_claims = ctx().with_extension(Claims::new("user:1"));
        assert!(Authenticated.check(&with_claims).is_ok());
    }

    #[test]
    fn test_has_permission() {
        let ctx = ctx().with_extension(Claims::new("user:1").with_permission("widgets:write"));
        assert!(HasPermission::new("widgets:write").check(&ctx).is_ok());

        let err = HasPermission::new("widgets:delete").check(&ctx).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.message(), "Permission 'widgets:delete' required");
    }

    #[test]
    fn test_denied_maps_to_api_error() {
        let api: ApiError = DenyAll.check(&ctx()).unwrap_err().into();
        assert_eq!(api.kind, ApiErrorKind::Forbidden);

        let api: ApiError = HasRole::new("admin").check(&ctx()).unwrap_err().into();
        assert_eq!(api.kind, ApiErrorKind::Unauthorized);
    }

    #[test]
    fn test_permission_class_builds_fresh_checks() {
        let class = permission_class(|| HasRole::new("admin"));
        let first = class();
        let second = class();
        assert_eq!(first.name(), "HasRole(admin)");
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(AllowAny.check(&ctx()).is_ok());
    }
}
