// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use vigil_chat::{ChatProcessor, DeviceRegistry, HistoryReader};
use vigil_config::model::ServerConfig;
use vigil_core::{IdentityVerifier, VigilError};

use crate::auth::auth_middleware;
use crate::handlers;

/// Health state for unauthenticated health/metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    pub start_time: std::time::Instant,
    /// Renders Prometheus text when the exporter is enabled.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub chat: Arc<ChatProcessor>,
    pub history: Arc<HistoryReader>,
    pub devices: Arc<DeviceRegistry>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub health: HealthState,
}

/// Builds the application router.
///
/// - GET /health, GET /metrics (public)
/// - POST /v1/chat/messages, POST /v1/chat/history (bearer auth)
/// - PUT /v1/devices/{token}, POST /v1/devices/{token}/badge/reset (bearer auth)
pub fn router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_public_health))
        .route("/metrics", get(handlers::get_public_metrics))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/chat/messages", post(handlers::post_chat_message))
        .route("/v1/chat/history", post(handlers::post_chat_history))
        .route("/v1/devices/{token}", put(handlers::put_device))
        .route(
            "/v1/devices/{token}/badge/reset",
            post(handlers::post_badge_reset),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.verifier.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds and serves until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), VigilError> {
    let app = router(state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| VigilError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| VigilError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
