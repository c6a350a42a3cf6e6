// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as hour windows, probabilities, and cron expressions.

use std::str::FromStr;

use crate::diagnostic::ConfigError;
use crate::model::VigilConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &VigilConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let addr = config.server.bind_address.trim();
    if addr.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.bind_address must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!(
                    "server.bind_address `{addr}` is not a valid IP address or hostname"
                ),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.chat.history_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "chat.history_limit must be at least 1".to_string(),
        });
    }

    let dispatch = &config.dispatch;

    if let Err(e) = croner::Cron::from_str(&dispatch.schedule) {
        errors.push(ConfigError::Validation {
            message: format!(
                "dispatch.schedule `{}` is not a valid cron expression: {e}",
                dispatch.schedule
            ),
        });
    }

    for (i, window) in dispatch.windows.iter().enumerate() {
        if window.start > 23 || window.end > 23 {
            errors.push(ConfigError::Validation {
                message: format!(
                    "dispatch.windows[{i}] hours must be within 0-23, got {}-{}",
                    window.start, window.end
                ),
            });
        } else if window.start > window.end {
            errors.push(ConfigError::Validation {
                message: format!(
                    "dispatch.windows[{i}] start {} is after end {}",
                    window.start, window.end
                ),
            });
        }
    }

    if !(0.0..=1.0).contains(&dispatch.skip_probability) {
        errors.push(ConfigError::Validation {
            message: format!(
                "dispatch.skip_probability must be within [0, 1], got {}",
                dispatch.skip_probability
            ),
        });
    }

    if dispatch.concurrency < 1 {
        errors.push(ConfigError::Validation {
            message: "dispatch.concurrency must be at least 1".to_string(),
        });
    }

    if dispatch.default_quote.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "dispatch.default_quote must not be empty".to_string(),
        });
    }

    if dispatch.quote_timeout_secs == 0 || dispatch.send_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "dispatch timeouts must be at least 1 second".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
