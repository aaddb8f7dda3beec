/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use log::{error, info, warn};

use g3_metric_daemon::quit::{QuitSignal, QuitWaiter};

pub mod config;
pub mod frontend;
pub mod opts;
pub mod signal;
pub mod store;

mod build;

use config::ServerConfig;
use frontend::{Frontend, FrontendStats};
use store::{MemoryStorage, MetricStorage};

/// Serve requests until `quit`, then run the final dump.
///
/// The dump task has its own quit signal, triggered only after the frontend
/// returned, so every acknowledged update is in the final snapshot.
pub async fn serve(
    storage: Arc<MemoryStorage>,
    frontend: Frontend,
    dump_interval: Option<Duration>,
    quit: QuitWaiter,
) {
    let dump_quit = QuitSignal::default();
    let dump_task = dump_interval.map(|interval| {
        tokio::spawn(store::dump::run_periodic(
            Arc::clone(&storage),
            interval,
            dump_quit.waiter(),
        ))
    });

    frontend.run(quit).await;

    dump_quit.trigger();
    if let Some(task) = dump_task
        && let Err(e) = task.await
    {
        error!("dump task exited abnormally: {e}");
    }
}

/// Open the storage, then serve until the process quit signal.
pub async fn run(config: &ServerConfig) -> anyhow::Result<()> {
    let storage = tokio::task::spawn_blocking({
        let store_config = config.store.clone();
        move || MemoryStorage::open(&store_config)
    })
    .await
    .context("failed to join storage open task")?
    .context("failed to open storage")?;
    let storage = Arc::new(storage);
    match &config.store.file_path {
        Some(path) if storage.sync_write() => {
            info!("storage opened, sync write to {}", path.display())
        }
        Some(path) => info!(
            "storage opened, dump to {} every {:?}",
            path.display(),
            config.store.store_interval
        ),
        None => info!("storage opened, memory only"),
    }
    if store::health(storage.as_ref()).is_down() {
        warn!("storage health check failed");
    }

    signal::register().context("failed to setup signal handler")?;

    let quit = g3_metric_daemon::quit::process();
    let frontend = Frontend::bind(
        config.listen,
        storage.clone(),
        Arc::new(FrontendStats::default()),
    )
    .await?;
    serve(
        Arc::clone(&storage),
        frontend,
        config.store.dump_interval(),
        quit.waiter(),
    )
    .await;

    if let Err(e) = storage.close() {
        error!("failed to close storage: {e}");
    }
    info!("server stopped");
    Ok(())
}
