/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use tokio::time::{Instant, MissedTickBehavior};

use g3_metric_daemon::quit::QuitWaiter;

use super::MemoryStorage;

async fn dump_blocking(storage: &Arc<MemoryStorage>) -> anyhow::Result<usize> {
    let storage = Arc::clone(storage);
    let count = tokio::task::spawn_blocking(move || storage.dump())
        .await
        .map_err(|e| anyhow::anyhow!("failed to join dump task: {e}"))??;
    Ok(count)
}

/// Dump the storage every `interval` until quit, then dump once more.
pub async fn run_periodic(storage: Arc<MemoryStorage>, interval: Duration, mut quit: QuitWaiter) {
    let mut timer = tokio::time::interval_at(Instant::now() + interval, interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = quit.wait() => break,
            _ = timer.tick() => {
                match dump_blocking(&storage).await {
                    Ok(count) => debug!("dumped {count} records"),
                    Err(e) => warn!("periodic dump failed: {e:?}"),
                }
            }
        }
    }

    match dump_blocking(&storage).await {
        Ok(count) => debug!("final dump of {count} records done"),
        Err(e) => error!("final dump failed: {e:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::store::file;
    use g3_metric_daemon::quit::QuitSignal;
    use g3_metric_model::Metric;

    fn load(path: &std::path::Path) -> Vec<Metric> {
        let mut records: Vec<Metric> = file::read_all(path)
            .unwrap()
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    #[tokio::test]
    async fn dump_on_quit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        let config = StoreConfig {
            file_path: Some(path.clone()),
            store_interval: Duration::from_secs(3600),
            restore: true,
        };
        let storage = Arc::new(MemoryStorage::open(&config).unwrap());
        assert!(load(&path).is_empty());

        let quit = QuitSignal::default();
        let task = tokio::spawn(run_periodic(
            storage.clone(),
            config.store_interval,
            quit.waiter(),
        ));

        storage.update_one(&Metric::counter("a", 3)).unwrap();
        storage.update_one(&Metric::gauge("b", 0.5)).unwrap();
        quit.trigger();
        task.await.unwrap();

        assert_eq!(
            load(&path),
            vec![Metric::counter("a", 3), Metric::gauge("b", 0.5)]
        );
    }

    #[tokio::test]
    async fn dump_on_tick() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        let config = StoreConfig {
            file_path: Some(path.clone()),
            store_interval: Duration::from_millis(20),
            restore: false,
        };
        let storage = Arc::new(MemoryStorage::open(&config).unwrap());

        let quit = QuitSignal::default();
        let task = tokio::spawn(run_periodic(
            storage.clone(),
            config.store_interval,
            quit.waiter(),
        ));

        for _ in 0..4 {
            storage.update_one(&Metric::counter("a", 1)).unwrap();
        }

        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if load(&path) == vec![Metric::counter("a", 4)] {
                break;
            }
            assert!(Instant::now() < deadline, "no periodic dump found");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        quit.trigger();
        task.await.unwrap();
    }
}
