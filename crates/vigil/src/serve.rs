// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vigil serve` - long-running gateway plus dispatch scheduler.

use std::sync::Arc;

use tracing::{info, warn};
use vigil_chat::{ChatProcessor, DeviceRegistry, HistoryReader};
use vigil_config::model::VigilConfig;
use vigil_core::{CompletionProvider, DocumentStore, PluginAdapter, VigilError};
use vigil_cron::{DispatchScheduler, Dispatcher};
use vigil_gateway::{GatewayState, HealthState, JwtVerifier};
use vigil_gemini::GeminiProvider;
use vigil_prometheus::PrometheusAdapter;
use vigil_push::FcmPushSender;
use vigil_storage::SqliteStore;

use crate::shutdown;

/// Runs the gateway and the scheduler until SIGINT/SIGTERM.
pub async fn run_serve(config: VigilConfig) -> Result<(), VigilError> {
    crate::init_tracing(&config.service.log_level);

    info!(service = %config.service.name, "starting vigil");

    let prometheus = if config.prometheus.enabled {
        match PrometheusAdapter::new() {
            Ok(adapter) => Some(adapter),
            Err(e) => {
                warn!(error = %e, "failed to initialize prometheus, metrics disabled");
                None
            }
        }
    } else {
        None
    };

    let sqlite = Arc::new(SqliteStore::open(config.storage.clone()).await?);
    let store: Arc<dyn DocumentStore> = sqlite.clone();
    info!(path = %config.storage.database_path, "storage ready");

    let provider: Arc<dyn CompletionProvider> = Arc::new(GeminiProvider::new(&config.gemini)?);

    let cancel = shutdown::install_signal_handler();

    let scheduler_handle = if config.dispatch.enabled {
        let push = Arc::new(FcmPushSender::new(&config.push).await?);
        let dispatcher = Arc::new(Dispatcher::new(
            store.clone(),
            provider.clone(),
            push,
            config.dispatch.clone(),
        ));
        let scheduler = DispatchScheduler::new(dispatcher, &config.dispatch.schedule)?;
        Some(tokio::spawn(scheduler.run(cancel.clone())))
    } else {
        info!("notification dispatch disabled");
        None
    };

    if config.server.enabled {
        let verifier = Arc::new(JwtVerifier::from_config(&config.auth)?);
        let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> =
            prometheus.as_ref().map(|adapter| {
                let handle = adapter.handle().clone();
                Arc::new(move || handle.render()) as Arc<dyn Fn() -> String + Send + Sync>
            });

        let state = GatewayState {
            chat: Arc::new(ChatProcessor::new(
                store.clone(),
                provider.clone(),
                &config.chat,
                &config.entitlement,
            )),
            history: Arc::new(HistoryReader::new(
                store.clone(),
                config.chat.history_limit,
            )),
            devices: Arc::new(DeviceRegistry::new(store.clone())),
            verifier,
            health: HealthState {
                start_time: std::time::Instant::now(),
                prometheus_render,
            },
        };

        if let Err(e) = vigil_gateway::start_server(&config.server, state, cancel.clone()).await {
            // The scheduler must not outlive a gateway that failed to bind.
            cancel.cancel();
            wait_for_scheduler(scheduler_handle).await;
            shutdown_store(&sqlite).await;
            return Err(e);
        }
    } else {
        info!("gateway disabled, running scheduler only");
        cancel.cancelled().await;
    }

    wait_for_scheduler(scheduler_handle).await;
    shutdown_store(&sqlite).await;

    info!("vigil stopped");
    Ok(())
}

async fn wait_for_scheduler(handle: Option<tokio::task::JoinHandle<()>>) {
    if let Some(handle) = handle {
        if let Err(e) = handle.await {
            warn!(error = %e, "dispatch scheduler task ended abnormally");
        }
    }
}

async fn shutdown_store(store: &SqliteStore) {
    if let Err(e) = store.shutdown().await {
        warn!(error = %e, "storage shutdown failed");
    }
}
