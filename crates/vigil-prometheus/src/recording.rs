// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade. Without an installed recorder every helper
//! is a no-op, so library code records unconditionally.

use metrics::{describe_counter, describe_histogram};

/// Register all Vigil metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "vigil_chat_messages_total",
        "Chat messages processed, by outcome"
    );
    describe_counter!(
        "vigil_notifications_total",
        "Push notifications attempted, by outcome"
    );
    describe_counter!(
        "vigil_dispatch_skips_total",
        "Users skipped by the dispatcher, by reason"
    );
    describe_counter!("vigil_dispatch_runs_total", "Dispatcher runs started");
    describe_histogram!(
        "vigil_dispatch_duration_seconds",
        "Wall-clock duration of a dispatcher run"
    );
}

/// Record a processed chat message (`ok`, `rate_limited`, `upstream_error`, ...).
pub fn record_chat_message(outcome: &'static str) {
    metrics::counter!("vigil_chat_messages_total", "outcome" => outcome).increment(1);
}

/// Record one push attempt (`sent`, `failed`, `token_removed`).
pub fn record_notification(outcome: &'static str) {
    metrics::counter!("vigil_notifications_total", "outcome" => outcome).increment(1);
}

/// Record a user skipped by the dispatcher (`timezone`, `random`, `dedup`).
pub fn record_dispatch_skip(reason: &'static str) {
    metrics::counter!("vigil_dispatch_skips_total", "reason" => reason).increment(1);
}

/// Record a finished dispatcher run.
pub fn record_dispatch_run(seconds: f64) {
    metrics::counter!("vigil_dispatch_runs_total").increment(1);
    metrics::histogram!("vigil_dispatch_duration_seconds").record(seconds);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_are_noops_without_recorder() {
        register_metrics();
        record_chat_message("ok");
        record_notification("sent");
        record_dispatch_skip("dedup");
        record_dispatch_run(0.25);
    }
}
