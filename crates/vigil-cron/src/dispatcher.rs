// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One run of the daily-notification dispatcher.
//!
//! Every user is considered independently. A user is notified at most once
//! per local calendar day, only inside the configured local-hour windows,
//! and only when a random draw does not spread them to a later hour. A
//! failure for one user or one device never stops the run; only a failure
//! to enumerate users does.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use futures::StreamExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use vigil_chat::QuoteGenerator;
use vigil_config::model::{DedupMode, DispatchConfig};
use vigil_core::types::{AndroidOptions, ApnsOptions};
use vigil_core::{
    CompletionProvider, DeviceRecord, DocumentStore, NewDailyQuote, PushMessage, PushSender,
    QuoteChannel, UserId, VigilError,
};

use crate::window;

/// Conversations consulted for personalization.
const PERSONALIZATION_CONVERSATIONS: usize = 3;
/// User messages passed to the quote generator.
const PERSONALIZATION_MESSAGES: usize = 5;

/// Aggregate counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub users: usize,
    pub users_without_devices: usize,
    pub devices_processed: usize,
    pub successes: usize,
    pub failures: usize,
    pub tokens_removed: usize,
    pub timezone_skips: usize,
    pub random_skips: usize,
    pub dedup_skips: usize,
    pub user_errors: usize,
}

#[derive(Debug)]
enum UserOutcome {
    NoDevices,
    OutsideWindow,
    RandomSkip,
    AlreadySent,
    Dispatched(DeviceTally),
    Failed,
}

#[derive(Debug, Default)]
struct DeviceTally {
    devices: usize,
    successes: usize,
    failures: usize,
    removed: usize,
}

impl DispatchReport {
    fn absorb(&mut self, outcome: UserOutcome) {
        match outcome {
            UserOutcome::NoDevices => self.users_without_devices += 1,
            UserOutcome::OutsideWindow => {
                self.timezone_skips += 1;
                vigil_prometheus::record_dispatch_skip("timezone");
            }
            UserOutcome::RandomSkip => {
                self.random_skips += 1;
                vigil_prometheus::record_dispatch_skip("random");
            }
            UserOutcome::AlreadySent => {
                self.dedup_skips += 1;
                vigil_prometheus::record_dispatch_skip("dedup");
            }
            UserOutcome::Dispatched(tally) => {
                self.devices_processed += tally.devices;
                self.successes += tally.successes;
                self.failures += tally.failures;
                self.tokens_removed += tally.removed;
            }
            UserOutcome::Failed => self.user_errors += 1,
        }
    }
}

pub struct Dispatcher {
    store: Arc<dyn DocumentStore>,
    quotes: QuoteGenerator,
    push: Arc<dyn PushSender>,
    config: DispatchConfig,
    rng: Mutex<StdRng>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        provider: Arc<dyn CompletionProvider>,
        push: Arc<dyn PushSender>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            store,
            quotes: QuoteGenerator::new(provider),
            push,
            config,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Replaces the random source with a seeded one, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Runs the dispatcher for the current instant.
    pub async fn run(&self) -> Result<DispatchReport, VigilError> {
        self.run_at(Utc::now()).await
    }

    /// Runs the dispatcher as if the clock read `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<DispatchReport, VigilError> {
        let started = Instant::now();
        info!(at = %now, utc_hour = now.hour(), "dispatch run starting");

        let users = self.store.list_user_ids().await.map_err(|e| {
            error!(error = %e, "user enumeration failed; aborting run");
            e
        })?;

        let mut report = DispatchReport {
            users: users.len(),
            ..DispatchReport::default()
        };
        if users.is_empty() {
            info!("no users found; nothing to dispatch");
            vigil_prometheus::record_dispatch_run(started.elapsed().as_secs_f64());
            return Ok(report);
        }

        let concurrency = self.config.concurrency.max(1);
        let mut outcomes = futures::stream::iter(users)
            .map(|user| async move { self.process_user(&user, now).await })
            .buffer_unordered(concurrency);
        while let Some(outcome) = outcomes.next().await {
            report.absorb(outcome);
        }

        vigil_prometheus::record_dispatch_run(started.elapsed().as_secs_f64());
        info!(
            users = report.users,
            devices = report.devices_processed,
            successes = report.successes,
            failures = report.failures,
            tokens_removed = report.tokens_removed,
            timezone_skips = report.timezone_skips,
            random_skips = report.random_skips,
            dedup_skips = report.dedup_skips,
            user_errors = report.user_errors,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dispatch run complete"
        );
        Ok(report)
    }

    async fn process_user(&self, user: &UserId, now: DateTime<Utc>) -> UserOutcome {
        let devices = match self.store.enabled_devices(user).await {
            Ok(devices) => devices,
            Err(e) => {
                warn!(user = %user, error = %e, "device lookup failed; skipping user");
                return UserOutcome::Failed;
            }
        };
        if devices.is_empty() {
            debug!(user = %user, "no enabled devices");
            return UserOutcome::NoDevices;
        }

        let offset = window::user_offset(&devices);
        let local_hour = window::local_hour(now.hour(), offset);
        if !window::in_windows(local_hour, &self.config.windows) {
            debug!(user = %user, offset, local_hour, "outside notification window");
            return UserOutcome::OutsideWindow;
        }

        let draw: f64 = self.rng.lock().await.gen_range(0.0..1.0);
        if draw < self.config.skip_probability {
            debug!(user = %user, draw, "randomly deferred to a later hour");
            return UserOutcome::RandomSkip;
        }

        let today = window::local_date(now, offset);
        match self.store.latest_quote(user, QuoteChannel::Notification).await {
            Ok(Some(latest)) if latest.sent_on(today) => {
                debug!(user = %user, last = %latest.timestamp, "already notified today");
                return UserOutcome::AlreadySent;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(user = %user, error = %e, "daily dedup check failed; skipping user");
                return UserOutcome::Failed;
            }
        }

        let recent = self.recent_user_messages(user).await;
        let quote = self.quote_for(user, &recent).await;

        let entry = NewDailyQuote {
            quote: quote.clone(),
            timestamp: now,
            channel: QuoteChannel::Notification,
            is_favorite: false,
        };
        let quote_id = match self.config.dedup_mode {
            DedupMode::Transactional => {
                match self
                    .store
                    .append_quote_if_not_sent_on(user, &entry, today)
                    .await
                {
                    Ok(Some(saved)) => saved.id,
                    Ok(None) => {
                        info!(user = %user, "concurrent run already notified today");
                        return UserOutcome::AlreadySent;
                    }
                    Err(e) => {
                        warn!(user = %user, error = %e, "quote audit write failed; sending anyway");
                        String::new()
                    }
                }
            }
            DedupMode::BestEffort => match self.store.append_quote(user, &entry).await {
                Ok(saved) => saved.id,
                Err(e) => {
                    warn!(user = %user, error = %e, "quote audit write failed; sending anyway");
                    String::new()
                }
            },
        };

        info!(user = %user, local_hour, devices = devices.len(), "notifying user");
        let mut tally = DeviceTally {
            devices: devices.len(),
            ..DeviceTally::default()
        };
        for device in &devices {
            self.notify_device(device, &quote, &quote_id, now, &mut tally)
                .await;
        }
        UserOutcome::Dispatched(tally)
    }

    async fn recent_user_messages(&self, user: &UserId) -> Vec<String> {
        match self
            .store
            .recent_conversations(user, PERSONALIZATION_CONVERSATIONS)
            .await
        {
            Ok(conversations) => conversations
                .iter()
                .flat_map(|c| c.user_messages())
                .take(PERSONALIZATION_MESSAGES)
                .map(str::to_string)
                .collect(),
            Err(e) => {
                warn!(user = %user, error = %e, "chat history unavailable; using generic quote");
                Vec::new()
            }
        }
    }

    async fn quote_for(&self, user: &UserId, recent: &[String]) -> String {
        let limit = Duration::from_secs(self.config.quote_timeout_secs);
        match tokio::time::timeout(limit, self.quotes.generate_quote(recent)).await {
            Ok(quote) if !quote.trim().is_empty() => quote,
            Ok(_) => {
                warn!(user = %user, "empty quote; using default");
                self.config.default_quote.clone()
            }
            Err(_) => {
                warn!(user = %user, timeout_secs = limit.as_secs(), "quote generation timed out; using default");
                self.config.default_quote.clone()
            }
        }
    }

    async fn notify_device(
        &self,
        device: &DeviceRecord,
        quote: &str,
        quote_id: &str,
        now: DateTime<Utc>,
        tally: &mut DeviceTally,
    ) {
        let user = &device.user_id;
        if let Err(e) = self.store.increment_badge(user, &device.token, now).await {
            warn!(user = %user, token = device.token_prefix(), error = %e, "badge increment failed");
            tally.failures += 1;
            vigil_prometheus::record_notification("failed");
            return;
        }

        let badge = match self.store.get_device(user, &device.token).await {
            Ok(Some(updated)) if updated.badge_count > 0 => updated.badge_count,
            Ok(_) => {
                warn!(token = device.token_prefix(), "device missing after badge update");
                1
            }
            Err(e) => {
                warn!(token = device.token_prefix(), error = %e, "badge re-read failed");
                1
            }
        };

        let message = build_notification(
            &device.token,
            &self.config.notification_title,
            quote,
            quote_id,
            badge,
            now,
        );

        let limit = Duration::from_secs(self.config.send_timeout_secs);
        let sent = match tokio::time::timeout(limit, self.push.send(&message)).await {
            Ok(result) => result.map_err(VigilError::from),
            Err(_) => Err(VigilError::Timeout { duration: limit }),
        };

        match sent {
            Ok(message_id) => {
                debug!(token = device.token_prefix(), message_id = %message_id, badge, "notification sent");
                tally.successes += 1;
                vigil_prometheus::record_notification("sent");
            }
            Err(VigilError::Push(e)) if e.is_token_invalid() => {
                info!(user = %user, token = device.token_prefix(), "removing unregistered token");
                tally.failures += 1;
                match self.store.delete_device(user, &device.token).await {
                    Ok(()) => {
                        tally.removed += 1;
                        vigil_prometheus::record_notification("token_removed");
                    }
                    Err(e) => {
                        warn!(token = device.token_prefix(), error = %e, "invalid token removal failed");
                        vigil_prometheus::record_notification("failed");
                    }
                }
            }
            Err(e) => {
                warn!(user = %user, token = device.token_prefix(), error = %e, "notification send failed");
                tally.failures += 1;
                vigil_prometheus::record_notification("failed");
            }
        }
    }
}

/// Builds the push payload for one device.
pub fn build_notification(
    token: &str,
    title: &str,
    quote: &str,
    quote_id: &str,
    badge: u32,
    now: DateTime<Utc>,
) -> PushMessage {
    let data = BTreeMap::from([
        ("type".to_string(), "daily_quote".to_string()),
        ("quote".to_string(), quote.to_string()),
        ("source".to_string(), "scheduled".to_string()),
        (
            "timestamp".to_string(),
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
        ("quoteId".to_string(), quote_id.to_string()),
        ("badgeCount".to_string(), badge.to_string()),
    ]);
    PushMessage {
        token: token.to_string(),
        title: title.to_string(),
        body: quote.to_string(),
        data,
        badge,
        apns: ApnsOptions::default(),
        android: AndroidOptions::default(),
    }
}
