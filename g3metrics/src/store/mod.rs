/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use ahash::AHashMap;

use g3_metric_model::{Metric, MetricKind};

mod error;
pub use error::StoreError;

mod codec;
pub use codec::{CodecError, SnapshotReader, decode_line, encode_line};

pub mod file;
pub use file::FileStore;

mod memory;
pub use memory::MemoryStorage;

pub mod dump;

/// The update API of a metrics storage engine.
pub trait MetricStorage: Send + Sync {
    /// Merge one metric, returns the stored result.
    fn update_by_metric(&self, metric: &Metric) -> Result<Metric, StoreError>;

    /// Merge in input order, stopping at the first error.
    fn update_batch(&self, metrics: &[Metric]) -> Result<(), StoreError>;

    fn value_by_metric(&self, id: &str, kind: MetricKind) -> Result<Metric, StoreError>;

    fn all_values(&self) -> Result<AHashMap<String, String>, StoreError>;

    fn ping(&self) -> Result<(), StoreError>;

    fn close(&self) -> Result<(), StoreError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Health {
    Up,
    NotApplicable,
    Down,
}

impl Health {
    pub fn is_down(&self) -> bool {
        matches!(self, Health::Down)
    }
}

pub fn health<S: MetricStorage + ?Sized>(storage: &S) -> Health {
    match storage.ping() {
        Ok(_) => Health::Up,
        Err(StoreError::UnsupportedOperation(_)) => Health::NotApplicable,
        Err(_) => Health::Down,
    }
}
