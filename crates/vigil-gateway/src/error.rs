// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from [`VigilError`] to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use vigil_core::VigilError;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Wraps a [`VigilError`] for use as a handler error.
///
/// Caller-facing variants keep their message. Infrastructure failures are
/// logged and answered with a generic text.
#[derive(Debug)]
pub struct ApiError(pub VigilError);

impl From<VigilError> for ApiError {
    fn from(e: VigilError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            VigilError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            VigilError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            VigilError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            VigilError::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            VigilError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match &self.0 {
            VigilError::Unauthenticated(_) => "authentication required".to_string(),
            VigilError::RateLimited(message) => message.clone(),
            VigilError::InvalidArgument(message) | VigilError::NotFound(message) => {
                message.clone()
            }
            VigilError::UpstreamUnavailable { .. } => {
                "Failed to generate AI response. Please try again later.".to_string()
            }
            _ => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}
