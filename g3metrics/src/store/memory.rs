/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::Path;
use std::sync::{Mutex, RwLock};

use ahash::AHashMap;
use log::{debug, info};

use g3_metric_model::{Metric, MetricKind, format_counter, format_gauge};

use super::{FileStore, MetricStorage, StoreError};
use crate::config::StoreConfig;

/// In-memory counters and gauges, with optional snapshot file durability.
///
/// Lock order is counters, then gauges, then the snapshot file.
pub struct MemoryStorage {
    counters: RwLock<AHashMap<String, i64>>,
    gauges: RwLock<AHashMap<String, f64>>,
    file: Option<Mutex<FileStore>>,
    sync_write: bool,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        MemoryStorage::new()
    }
}

impl MemoryStorage {
    /// A storage without any snapshot file.
    pub fn new() -> Self {
        MemoryStorage {
            counters: RwLock::new(AHashMap::new()),
            gauges: RwLock::new(AHashMap::new()),
            file: None,
            sync_write: false,
        }
    }

    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut storage = MemoryStorage::new();
        let Some(path) = &config.file_path else {
            debug!("no snapshot file configured, metrics will be kept in memory only");
            return Ok(storage);
        };

        if config.restore {
            storage
                .restore_from(path)
                .map_err(|e| StoreError::RestoreFailed {
                    path: path.clone(),
                    source: Box::new(e),
                })?;
        }

        let mut file = FileStore::open(path)?;
        let records = storage.snapshot_records();
        if records.is_empty() {
            file.truncate()?;
        } else {
            file.replace_all(&records)?;
        }
        storage.file = Some(Mutex::new(file));
        storage.sync_write = config.sync_write();
        Ok(storage)
    }

    fn restore_from(&self, path: &Path) -> Result<(), StoreError> {
        let Some(reader) = super::file::read_all(path)? else {
            info!("no snapshot found at {}, start empty", path.display());
            return Ok(());
        };

        let mut count = 0usize;
        for r in reader {
            let metric = r?;
            match metric.kind {
                MetricKind::Counter => {
                    let Some(delta) = metric.delta else {
                        return Err(StoreError::EmptyDelta(metric.id));
                    };
                    let mut counters = self.counters.write().unwrap();
                    counters.insert(metric.id, delta);
                }
                MetricKind::Gauge => {
                    self.update_one(&metric)?;
                }
            }
            count += 1;
        }
        info!("restored {count} records from {}", path.display());
        Ok(())
    }

    #[inline]
    pub fn sync_write(&self) -> bool {
        self.sync_write
    }

    #[inline]
    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    fn persist(&self, metric: &Metric) -> Result<(), StoreError> {
        if !self.sync_write {
            return Ok(());
        }
        if let Some(file) = &self.file {
            let mut file = file.lock().unwrap();
            file.append(metric)?;
        }
        Ok(())
    }

    pub fn update_one(&self, metric: &Metric) -> Result<Metric, StoreError> {
        match metric.kind {
            MetricKind::Counter => {
                let Some(delta) = metric.delta else {
                    return Err(StoreError::EmptyDelta(metric.id.clone()));
                };
                metric.validate()?;

                let mut counters = self.counters.write().unwrap();
                let total = counters
                    .get(&metric.id)
                    .copied()
                    .unwrap_or(0)
                    .wrapping_add(delta);
                let updated = Metric::counter(metric.id.as_str(), total);
                self.persist(&updated)?;
                counters.insert(metric.id.clone(), total);
                Ok(updated)
            }
            MetricKind::Gauge => {
                let Some(value) = metric.value else {
                    return Err(StoreError::EmptyValue(metric.id.clone()));
                };
                metric.validate()?;

                let mut gauges = self.gauges.write().unwrap();
                let updated = Metric::gauge(metric.id.as_str(), value);
                self.persist(&updated)?;
                gauges.insert(metric.id.clone(), value);
                Ok(updated)
            }
        }
    }

    pub fn value_of(&self, id: &str, kind: MetricKind) -> Result<Metric, StoreError> {
        let found = match kind {
            MetricKind::Counter => {
                let counters = self.counters.read().unwrap();
                counters.get(id).map(|v| Metric::counter(id, *v))
            }
            MetricKind::Gauge => {
                let gauges = self.gauges.read().unwrap();
                gauges.get(id).map(|v| Metric::gauge(id, *v))
            }
        };
        found.ok_or_else(|| StoreError::NotFound {
            id: id.to_string(),
            kind,
        })
    }

    /// A consistent copy of every stored metric.
    pub fn snapshot_records(&self) -> Vec<Metric> {
        let counters = self.counters.read().unwrap();
        let gauges = self.gauges.read().unwrap();
        let mut records = Vec::with_capacity(counters.len() + gauges.len());
        records.extend(counters.iter().map(|(k, v)| Metric::counter(k.as_str(), *v)));
        records.extend(gauges.iter().map(|(k, v)| Metric::gauge(k.as_str(), *v)));
        records
    }

    /// Rewrite the snapshot file with the current state.
    ///
    /// Returns the number of records written.
    pub fn dump(&self) -> Result<usize, StoreError> {
        let Some(file) = &self.file else {
            return Ok(0);
        };
        let records = self.snapshot_records();
        let mut file = file.lock().unwrap();
        file.replace_all(&records)?;
        Ok(records.len())
    }
}

impl MetricStorage for MemoryStorage {
    fn update_by_metric(&self, metric: &Metric) -> Result<Metric, StoreError> {
        self.update_one(metric)
    }

    fn update_batch(&self, metrics: &[Metric]) -> Result<(), StoreError> {
        for metric in metrics {
            self.update_one(metric)?;
        }
        Ok(())
    }

    fn value_by_metric(&self, id: &str, kind: MetricKind) -> Result<Metric, StoreError> {
        self.value_of(id, kind)
    }

    fn all_values(&self) -> Result<AHashMap<String, String>, StoreError> {
        let counters = self.counters.read().unwrap();
        let gauges = self.gauges.read().unwrap();
        let mut values = AHashMap::with_capacity(counters.len() + gauges.len());
        for (k, v) in counters.iter() {
            values.insert(k.clone(), format_counter(*v));
        }
        for (k, v) in gauges.iter() {
            values.insert(k.clone(), format_gauge(*v));
        }
        Ok(values)
    }

    fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::UnsupportedOperation("memory"))
    }

    fn close(&self) -> Result<(), StoreError> {
        if let Some(file) = &self.file {
            let mut file = file.lock().unwrap();
            file.close()?;
        }
        Ok(())
    }
}
