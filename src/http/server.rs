//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router serving the document root
//! - Wire up middleware (errors, timeout, request ID, tracing)
//! - Bind server to listener and shut down gracefully

use axum::Router;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::errors::ErrorsLayer;

/// HTTP server for a single site.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server. Startup hooks must have run already.
    pub fn new(config: ServerConfig, errors: Option<ErrorsLayer>) -> Self {
        let router = Self::build_router(&config, errors);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, errors: Option<ErrorsLayer>) -> Router {
        let mut router = Router::new()
            .fallback_service(ServeDir::new(&config.site.root))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        if let Some(errors) = errors {
            router = router.layer(errors);
        }

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// The assembled router, for serving without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            root = %self.config.site.root.display(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_serves_root_and_sets_request_id() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "home").unwrap();
        let mut config = ServerConfig::default();
        config.site.root = dir.path().to_path_buf();

        let server = HttpServer::new(config, None);
        let response = server
            .router()
            .oneshot(Request::builder().uri("/index.html").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }
}
