//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Bind server to listener and stop on the shutdown signal

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::http::handlers::{get_status, get_user, get_user_without_id, USERS_ROUTE};
use crate::http::request::MakeRequestUuidV4;
use crate::observability::Telemetry;
use crate::usecase::UserUseCase;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserUseCase>,
    pub telemetry: Telemetry,
}

impl AppState {
    pub fn new(telemetry: Telemetry) -> Self {
        Self {
            users: Arc::new(UserUseCase::new(telemetry.clone())),
            telemetry,
        }
    }
}

/// HTTP server for the user service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &ServiceConfig, telemetry: Telemetry) -> Self {
        Self {
            router: build_router(config, AppState::new(telemetry)),
        }
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

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &ServiceConfig, state: AppState) -> Router {
    Router::new()
        .route(USERS_ROUTE, get(get_user))
        .route("/users/", get(get_user_without_id))
        .route("/health", get(get_status))
        .with_state(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(Duration::from_secs(config.listener.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::X_REQUEST_ID;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(&ServiceConfig::default(), AppState::new(Telemetry::noop()))
    }

    async fn get(uri: &str) -> (StatusCode, Value) {
        let response = app()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_known_user() {
        let (status, body) = get("/users/123").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "data": "Usuário de exemplo" }));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let (status, body) = get("/users/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["details"], json!({ "id": "999" }));
    }

    #[tokio::test]
    async fn test_empty_id() {
        let (status, body) = get("/users/").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
        assert_eq!(body["error"]["details"], json!({ "field": "id" }));
    }

    #[tokio::test]
    async fn test_unexpected_failure() {
        let (status, body) = get("/users/500").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({ "error": { "code": "INTERNAL_ERROR", "message": "unexpected error" } })
        );
    }

    #[tokio::test]
    async fn test_undecodable_id_uses_error_envelope() {
        let (status, body) = get("/users/%FF").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
        assert_eq!(body["error"]["details"], json!({ "field": "id" }));
    }

    #[tokio::test]
    async fn test_response_echoes_trace_context() {
        let response = app()
            .oneshot(
                Request::get("/users/123")
                    .header("traceparent", "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let traceparent = response.headers()["traceparent"].to_str().unwrap();
        assert!(traceparent.starts_with("00-4bf92f3577b34da6a3ce929d0e0e4736-"));

        let response = app()
            .oneshot(Request::get("/users/123").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(!response.headers().contains_key("traceparent"));
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_request_id_is_generated_and_propagated() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key(X_REQUEST_ID));

        let response = app()
            .oneshot(
                Request::get("/health")
                    .header(X_REQUEST_ID, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[X_REQUEST_ID], "abc-123");
    }
}
