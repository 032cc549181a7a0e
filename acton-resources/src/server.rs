//! HTTP server with graceful shutdown

use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::{config::Config, error::Result};

/// Server instance
pub struct Server {
    config: Config,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the server with the given router
    ///
    /// Every resource must be registered before the router is built; the
    /// server never sees later registrations.
    pub async fn serve(self, app: Router) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.service.port));

        tracing::info!("Starting {} on {}", self.config.service.name, addr);
        self.log_middleware_config();

        let app = self.apply_middleware(app);

        let listener = TcpListener::bind(&addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    /// Wrap `app` with the configured middleware stack
    pub fn apply_middleware(&self, app: Router) -> Router {
        let middleware = &self.config.middleware;

        let mut app = app;
        if let Some(cors_layer) = self.build_cors_layer() {
            app = app.layer(cors_layer);
        }
        if middleware.compression {
            app = app.layer(CompressionLayer::new());
        }
        app = app
            .layer(TimeoutLayer::with_status_code(
                http::StatusCode::REQUEST_TIMEOUT,
                self.config.service.timeout(),
            ))
            .layer(RequestBodyLimitLayer::new(middleware.body_limit_bytes()))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().include_headers(true))
                    .on_response(DefaultOnResponse::new().include_headers(true)),
            );
        if middleware.catch_panic {
            app = app.layer(CatchPanicLayer::new());
        }
        app
    }

    fn log_middleware_config(&self) {
        let middleware = &self.config.middleware;
        tracing::info!("Middleware configuration:");
        tracing::info!(
            "  - Panic recovery: {}",
            if middleware.catch_panic { "enabled" } else { "disabled" }
        );
        tracing::info!("  - Request body limit: {} MB", middleware.body_limit_mb);
        tracing::info!(
            "  - Compression: {}",
            if middleware.compression { "enabled" } else { "disabled" }
        );
        tracing::info!("  - CORS mode: {}", middleware.cors_mode);
        tracing::info!(
            "  - Request timeout: {} seconds",
            self.config.service.timeout_secs
        );
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn build_cors_layer(&self) -> Option<CorsLayer> {
        match self.config.middleware.cors_mode.as_str() {
            "permissive" => {
                tracing::debug!("Enabling permissive CORS");
                Some(CorsLayer::permissive())
            }
            "restrictive" => {
                tracing::debug!("Enabling restrictive CORS (default deny)");
                Some(CorsLayer::new())
            }
            "disabled" => {
                tracing::debug!("CORS disabled");
                None
            }
            _ => {
                tracing::warn!(
                    "Unknown CORS mode: {}, defaulting to permissive",
                    self.config.middleware.cors_mode
                );
                Some(CorsLayer::permissive())
            }
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    tracing::info!("Shutdown signal received, draining requests...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generics::{ListCreateResource, ResourceDescriptor};
    use crate::namespace::Namespace;
    use crate::permissions::{permission_class, DenyAll};
    use crate::repository::InMemoryStore;
    use crate::schema::JsonSchema;
    use crate::testing::Widget;
    use axum::body::Body;
    use http::StatusCode;
    use tower::ServiceExt;

    fn denying_widgets_app(config: Config) -> Router {
        let mut ns = Namespace::new("widgets");
        ns.add_resource(
            "/",
            ListCreateResource::new(
                ResourceDescriptor::new("widgets", JsonSchema::<Widget>::new("WidgetSchema"))
                    .with_model(InMemoryStore::<Widget>::new())
                    .with_permission(permission_class(|| DenyAll)),
            )
            .unwrap(),
        )
        .unwrap();
        Server::new(config).apply_middleware(ns.router())
    }

    fn open_widgets_app(config: Config) -> Router {
        let mut ns = Namespace::new("widgets");
        ns.add_resource(
            "/",
            ListCreateResource::new(
                ResourceDescriptor::new("widgets", JsonSchema::<Widget>::new("WidgetSchema"))
                    .with_model(InMemoryStore::<Widget>::new()),
            )
            .unwrap(),
        )
        .unwrap();
        Server::new(config).apply_middleware(ns.router())
    }

    fn post(body: Body) -> http::Request<Body> {
        http::Request::builder()
            .method(http::Method::POST)
            .uri("/widgets")
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap()
    }

    #[test]
    fn test_server_creation() {
        let config = Config::default();
        let server = Server::new(config.clone());
        assert_eq!(server.config().service.port, config.service.port);
    }

    #[tokio::test]
    async fn test_middleware_enforces_body_limit() {
        let mut config = Config::default();
        config.middleware.body_limit_mb = 0;
        config.middleware.cors_mode = "disabled".to_string();

        let app = open_widgets_app(config);

        let response = app
            .clone()
            .oneshot(
                http::Request::builder()
                    .uri("/widgets")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = r#"{"name": "too big"}"#;
        let response = app
            .oneshot(
                http::Request::builder()
                    .method(http::Method::POST)
                    .uri("/widgets")
                    .header(http::header::CONTENT_LENGTH, body.len())
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_configured_limit_governs_bodies_above_two_mib() {
        let mut config = Config::default();
        config.middleware.cors_mode = "disabled".to_string();
        assert_eq!(config.middleware.body_limit_mb, 10);

        let name = "x".repeat(3 * 1024 * 1024);
        let body = serde_json::json!({ "name": name }).to_string();
        let response = open_widgets_app(config)
            .oneshot(post(Body::from(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_body_without_length_over_limit_is_payload_too_large() {
        let mut config = Config::default();
        config.middleware.body_limit_mb = 1;
        config.middleware.cors_mode = "disabled".to_string();

        // No content-length header, so the limit trips while the body is read
        let response = open_widgets_app(config)
            .oneshot(post(Body::from(vec![b'x'; 2 * 1024 * 1024])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_rejected_request_body_is_never_read() {
        let mut config = Config::default();
        config.middleware.body_limit_mb = 1;
        config.middleware.cors_mode = "disabled".to_string();

        let response = denying_widgets_app(config)
            .oneshot(post(Body::from(vec![b'x'; 2 * 1024 * 1024])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
