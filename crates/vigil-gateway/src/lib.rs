// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Vigil backend.
//!
//! Exposes the chat, history and device operations as JSON endpoints behind
//! bearer-token authentication, plus public health and metrics endpoints.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::JwtVerifier;
pub use error::ApiError;
pub use server::{GatewayState, HealthState, router, start_server};
