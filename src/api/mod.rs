//! Signal Relay HTTP Surface
//!
//! HTTP layer for the relay, built with Axum.
//!
//! # Endpoints
//!
//! ## Signaling
//! - `GET /` - WebSocket signaling connection
//! - `GET /ws` - Same, for deployments that reserve `/` for something else
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use signal_relay::api::{serve, AppState};
//! use signal_relay::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let state = AppState::new(Config::default());
//!     serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::signaling::{websocket_handler, RoomRegistry};

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .route("/", get(websocket_handler))
        .route("/ws", get(websocket_handler))
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the server on the configured address
pub async fn serve(state: AppState) -> ApiResult<()> {
    let addr = state.config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Signal relay listening on {}", listener.local_addr()?);

    serve_on(listener, state).await
}

/// Serve on an already bound listener until Ctrl-C or SIGTERM
pub async fn serve_on(listener: tokio::net::TcpListener, state: AppState) -> ApiResult<()> {
    let registry = Arc::clone(&state.registry);
    let router = build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(registry))
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Signal relay shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal, then close every room
async fn shutdown_signal(registry: Arc<RoomRegistry>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
    registry.close_all().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::signaling::ConnectionHandle;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tokio::sync::mpsc;
    use tower::util::ServiceExt;

    fn create_test_app() -> (Router, Arc<RoomRegistry>) {
        let state = AppState::new(Config::default());
        let registry = Arc::clone(&state.registry);
        (build_router(state), registry)
    }

    #[tokio::test]
    async fn test_health_live() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full_reports_rooms() {
        let (app, registry) = create_test_app();
        let (tx, _rx) = mpsc::unbounded_channel();
        registry
            .get_or_create("1")
            .await
            .lock()
            .await
            .add(ConnectionHandle::new("c1", "a", "1", tx))
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["rooms"], 1);
        assert_eq!(json["occupied_rooms"], 1);
        assert_eq!(json["joined"], 1);
    }

    #[tokio::test]
    async fn test_plain_get_on_ws_route_is_rejected() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
