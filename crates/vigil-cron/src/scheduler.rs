// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cron-driven trigger for the dispatcher.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use croner::Cron;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use vigil_core::VigilError;

use crate::dispatcher::{DispatchReport, Dispatcher};

/// Fires the dispatcher on every occurrence of a cron expression.
///
/// At most one run executes at a time. A tick that arrives while the
/// previous run is still going is skipped rather than queued.
pub struct DispatchScheduler {
    dispatcher: Arc<Dispatcher>,
    schedule: Cron,
    expression: String,
    running: Arc<Mutex<()>>,
}

impl DispatchScheduler {
    pub fn new(dispatcher: Arc<Dispatcher>, expression: &str) -> Result<Self, VigilError> {
        let schedule = Cron::from_str(expression).map_err(|e| {
            VigilError::Config(format!("invalid dispatch schedule `{expression}`: {e}"))
        })?;
        Ok(Self {
            dispatcher,
            schedule,
            expression: expression.to_string(),
            running: Arc::new(Mutex::new(())),
        })
    }

    /// The first occurrence strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Result<DateTime<Utc>, VigilError> {
        self.schedule
            .find_next_occurrence(&after, false)
            .map_err(|e| VigilError::Internal(format!("no next occurrence for `{}`: {e}", self.expression)))
    }

    /// Runs the dispatcher now unless a run is already in progress.
    ///
    /// Returns `None` when the tick was skipped.
    pub async fn trigger(&self) -> Option<Result<DispatchReport, VigilError>> {
        let Ok(_guard) = self.running.clone().try_lock_owned() else {
            warn!("previous dispatch run still in progress; skipping tick");
            return None;
        };
        Some(self.dispatcher.run().await)
    }

    /// Loops until `cancel` fires, spawning a run at each occurrence.
    ///
    /// Each run is evaluated at the occurrence it was scheduled for, not at
    /// the moment the timer woke. On cancel, returns only after a run in
    /// flight has finished.
    pub async fn run(self, cancel: CancellationToken) {
        info!(schedule = %self.expression, "dispatch scheduler started");
        loop {
            let now = Utc::now();
            let next = match self.next_after(now) {
                Ok(next) => next,
                Err(e) => {
                    error!(error = %e, "dispatch scheduler stopping");
                    return;
                }
            };
            let wait = (next - now).to_std().unwrap_or_default();
            debug!(next = %next, wait_secs = wait.as_secs(), "sleeping until next dispatch");

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("dispatch scheduler shutting down");
                    let _idle = self.running.lock().await;
                    debug!("no dispatch run in flight");
                    return;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            let Ok(guard) = self.running.clone().try_lock_owned() else {
                warn!("previous dispatch run still in progress; skipping tick");
                continue;
            };
            let dispatcher = self.dispatcher.clone();
            tokio::spawn(async move {
                let _guard = guard;
                if let Err(e) = dispatcher.run_at(next).await {
                    error!(error = %e, "dispatch run failed");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use vigil_config::model::DispatchConfig;
    use vigil_test_utils::{MockCompletion, MockPushSender, TestStore};

    async fn scheduler(expr: &str) -> (TestStore, Result<DispatchScheduler, VigilError>) {
        let harness = TestStore::new().await.unwrap();
        let dispatcher = Arc::new(Dispatcher::new(
            harness.documents(),
            Arc::new(MockCompletion::new()),
            Arc::new(MockPushSender::new()),
            DispatchConfig::default(),
        ));
        let scheduler = DispatchScheduler::new(dispatcher, expr);
        (harness, scheduler)
    }

    #[tokio::test]
    async fn hourly_schedule_fires_at_top_of_hour() {
        let (_harness, scheduler) = scheduler("0 * * * *").await;
        let scheduler = scheduler.unwrap();
        let at = Utc.with_ymd_and_hms(2026, 4, 1, 10, 17, 3).unwrap();
        assert_eq!(
            scheduler.next_after(at).unwrap(),
            Utc.with_ymd_and_hms(2026, 4, 1, 11, 0, 0).unwrap()
        );
        let on_the_hour = Utc.with_ymd_and_hms(2026, 4, 1, 11, 0, 0).unwrap();
        assert_eq!(
            scheduler.next_after(on_the_hour).unwrap(),
            Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn invalid_expression_is_config_error() {
        let (_harness, scheduler) = scheduler("every hour").await;
        assert!(matches!(scheduler, Err(VigilError::Config(_))));
    }

    #[tokio::test]
    async fn overlapping_trigger_is_skipped() {
        let (_harness, scheduler) = scheduler("0 * * * *").await;
        let scheduler = scheduler.unwrap();

        let held = scheduler.running.clone().try_lock_owned().unwrap();
        assert!(scheduler.trigger().await.is_none());
        drop(held);

        let report = scheduler.trigger().await.unwrap().unwrap();
        assert_eq!(report.users, 0);
    }

    #[tokio::test]
    async fn shutdown_waits_for_run_in_flight() {
        let (_harness, scheduler) = scheduler("0 * * * *").await;
        let scheduler = scheduler.unwrap();
        let in_flight = scheduler.running.clone().try_lock_owned().unwrap();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(scheduler.run(cancel.clone()));
        cancel.cancel();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        drop(in_flight);
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let (_harness, scheduler) = scheduler("0 * * * *").await;
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(scheduler.unwrap().run(cancel.clone()));
        cancel.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
