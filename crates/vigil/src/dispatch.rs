// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vigil dispatch` - one dispatcher run, report on stdout.

use std::sync::Arc;

use tracing::warn;
use vigil_config::model::VigilConfig;
use vigil_core::{PluginAdapter, VigilError};
use vigil_cron::{DispatchReport, Dispatcher};
use vigil_gemini::GeminiProvider;
use vigil_push::FcmPushSender;
use vigil_storage::SqliteStore;

/// Runs every eligible user through the dispatcher once.
///
/// Ignores `dispatch.enabled` and the cron schedule. The window gate and
/// dedup still apply, so a second invocation in the same local day sends
/// nothing.
pub async fn run_dispatch(config: VigilConfig) -> Result<(), VigilError> {
    crate::init_tracing(&config.service.log_level);

    let sqlite = Arc::new(SqliteStore::open(config.storage.clone()).await?);
    let provider = Arc::new(GeminiProvider::new(&config.gemini)?);
    let push = Arc::new(FcmPushSender::new(&config.push).await?);

    let dispatcher = Dispatcher::new(sqlite.clone(), provider, push, config.dispatch.clone());
    let result = dispatcher.run().await;

    if let Err(e) = sqlite.shutdown().await {
        warn!(error = %e, "storage shutdown failed");
    }

    print_report(&result?)
}

fn print_report(report: &DispatchReport) -> Result<(), VigilError> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| VigilError::Internal(format!("failed to serialize report: {e}")))?;
    println!("{json}");
    Ok(())
}
