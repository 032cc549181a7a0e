//! Response type produced by composed handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

/// Status plus JSON body
///
/// # Example
///
/// ```rust
/// use acton_resources::handlers::Reply;
/// use serde_json::json;
///
/// let reply = Reply::ok(json!([]));
/// assert_eq!(reply.status.as_u16(), 200);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// HTTP status code
    pub status: StatusCode,
    /// JSON body
    pub body: Value,
}

impl Reply {
    /// Create a reply with an explicit status
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    /// 200 OK
    pub fn ok(body: Value) -> Self {
        Self::new(StatusCode::OK, body)
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_response_keeps_status() {
        let response = Reply::new(StatusCode::ACCEPTED, json!(null)).into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
