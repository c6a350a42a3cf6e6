// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Vigil backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Vigil configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VigilConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Bearer token verification.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Gemini text-completion settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Firebase Cloud Messaging settings.
    #[serde(default)]
    pub push: PushConfig,

    /// Chat processing limits.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Billing entitlement identifiers.
    #[serde(default)]
    pub entitlement: EntitlementConfig,

    /// Scheduled notification dispatch.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Prometheus metrics exporter.
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Instance name, used in logs.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "vigil".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Whether `vigil serve` starts the HTTP gateway.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Address to bind the server to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Bearer token verification configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// HS256 shared secret. Required when the gateway is enabled.
    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// Expected `iss` claim, if any.
    #[serde(default)]
    pub issuer: Option<String>,

    /// Expected `aud` claim, if any.
    #[serde(default)]
    pub audience: Option<String>,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("vigil").join("vigil.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("vigil.db"))
        .to_string_lossy()
        .into_owned()
}

/// Gemini API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// API key. `None` falls back to the `GEMINI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for chat replies and quotes.
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// API base URL.
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_gemini_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
            timeout_secs: default_gemini_timeout_secs(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_timeout_secs() -> u64 {
    60
}

/// Firebase Cloud Messaging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PushConfig {
    /// Firebase project id. Taken from the service account key when unset.
    #[serde(default)]
    pub project_id: Option<String>,

    /// Path to a service account JSON key used to mint OAuth2 tokens.
    #[serde(default)]
    pub service_account_path: Option<String>,

    /// Static OAuth2 access token. Takes precedence over the service account.
    #[serde(default)]
    pub access_token: Option<String>,

    /// FCM API base URL.
    #[serde(default = "default_fcm_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_push_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            service_account_path: None,
            access_token: None,
            base_url: default_fcm_base_url(),
            timeout_secs: default_push_timeout_secs(),
        }
    }
}

fn default_fcm_base_url() -> String {
    "https://fcm.googleapis.com".to_string()
}

fn default_push_timeout_secs() -> u64 {
    10
}

/// Chat processing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Messages a non-premium user may send in total.
    #[serde(default = "default_free_tier_limit")]
    pub free_tier_limit: u64,

    /// Conversations returned by the history endpoint.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            free_tier_limit: default_free_tier_limit(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_free_tier_limit() -> u64 {
    30
}

fn default_history_limit() -> usize {
    50
}

/// Billing entitlement identifiers as mirrored into the customers record.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EntitlementConfig {
    /// Product identifier under `subscriptions`.
    #[serde(default = "default_product_id")]
    pub product_id: String,

    /// Entitlement name under the product's `entitlements`.
    #[serde(default = "default_entitlement_id")]
    pub entitlement_id: String,
}

impl Default for EntitlementConfig {
    fn default() -> Self {
        Self {
            product_id: default_product_id(),
            entitlement_id: default_entitlement_id(),
        }
    }
}

fn default_product_id() -> String {
    "com.hunyhun.aisaint.premium.monthly".to_string()
}

fn default_entitlement_id() -> String {
    "Monthly Premium".to_string()
}

/// How the dispatcher guards against a second send on the same day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupMode {
    /// Check and audit insert happen in one store transaction.
    #[default]
    Transactional,
    /// Plain read of the latest entry followed by an unconditional insert.
    BestEffort,
}

/// An inclusive local-hour window, e.g. `{ start = 7, end = 9 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HourWindow {
    pub start: u32,
    pub end: u32,
}

/// Scheduled notification dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Whether `vigil serve` runs the scheduler.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cron expression, evaluated in UTC.
    #[serde(default = "default_schedule")]
    pub schedule: String,

    /// Local-hour windows in which a user may be notified.
    #[serde(default = "default_windows")]
    pub windows: Vec<HourWindow>,

    /// Probability of skipping an otherwise eligible user on a run.
    #[serde(default = "default_skip_probability")]
    pub skip_probability: f64,

    /// Daily dedup strategy.
    #[serde(default)]
    pub dedup_mode: DedupMode,

    /// Users processed in parallel.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Notification title.
    #[serde(default = "default_notification_title")]
    pub notification_title: String,

    /// Body used when quote generation does not complete or yields nothing.
    #[serde(default = "default_quote")]
    pub default_quote: String,

    /// Upper bound on a quote generation call, in seconds.
    #[serde(default = "default_quote_timeout_secs")]
    pub quote_timeout_secs: u64,

    /// Upper bound on a single push send, in seconds.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedule: default_schedule(),
            windows: default_windows(),
            skip_probability: default_skip_probability(),
            dedup_mode: DedupMode::default(),
            concurrency: default_concurrency(),
            notification_title: default_notification_title(),
            default_quote: default_quote(),
            quote_timeout_secs: default_quote_timeout_secs(),
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

fn default_schedule() -> String {
    "0 * * * *".to_string()
}

fn default_windows() -> Vec<HourWindow> {
    vec![
        HourWindow { start: 7, end: 9 },
        HourWindow { start: 18, end: 20 },
    ]
}

fn default_skip_probability() -> f64 {
    0.5
}

fn default_concurrency() -> usize {
    1
}

fn default_notification_title() -> String {
    "Your Daily Spiritual Message".to_string()
}

fn default_quote() -> String {
    "May your day be filled with peace and spiritual connection.".to_string()
}

fn default_quote_timeout_secs() -> u64 {
    90
}

fn default_send_timeout_secs() -> u64 {
    15
}

/// Prometheus metrics exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    /// Install the exporter and serve `/metrics`.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
