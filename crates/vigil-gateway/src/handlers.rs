// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use vigil_core::{ConversationId, ConversationSummary, DeviceRegistration, Identity};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Request body for POST /v1/chat/messages.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Response body for POST /v1/chat/messages.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub role: &'static str,
    pub message: String,
    /// Duplicate of `message`, kept for older clients.
    pub response: String,
    pub conversation_id: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// POST /v1/chat/messages
pub async fn post_chat_message(
    State(state): State<GatewayState>,
    caller: Option<Extension<Identity>>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let conversation_id = body
        .conversation_id
        .filter(|id| !id.is_empty())
        .map(ConversationId);
    let reply = state
        .chat
        .process_message(caller.as_deref(), &body.message, conversation_id)
        .await?;

    Ok(Json(ChatResponse {
        role: "assistant",
        message: reply.reply.clone(),
        response: reply.reply,
        conversation_id: reply.conversation_id.0,
    }))
}

/// POST /v1/chat/history
pub async fn post_chat_history(
    State(state): State<GatewayState>,
    caller: Option<Extension<Identity>>,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    let history = state.history.get_history(caller.as_deref()).await?;
    Ok(Json(history))
}

/// PUT /v1/devices/{token}
pub async fn put_device(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Identity>,
    Path(token): Path<String>,
    Json(registration): Json<DeviceRegistration>,
) -> Result<StatusCode, ApiError> {
    state
        .devices
        .register_device(&caller, &token, &registration)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/devices/{token}/badge/reset
pub async fn post_badge_reset(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Identity>,
    Path(token): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.devices.reset_badge(&caller, &token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /health
pub async fn get_public_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics
pub async fn get_public_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
