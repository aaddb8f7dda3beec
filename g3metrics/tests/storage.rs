/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use g3_metric_model::{Metric, MetricKind};
use g3metrics::config::StoreConfig;
use g3metrics::store::{MemoryStorage, MetricStorage, StoreError, file, health};

fn sync_config(path: &Path) -> StoreConfig {
    StoreConfig {
        file_path: Some(path.to_path_buf()),
        store_interval: Duration::ZERO,
        restore: true,
    }
}

fn periodic_config(path: &Path) -> StoreConfig {
    StoreConfig {
        file_path: Some(path.to_path_buf()),
        store_interval: Duration::from_secs(300),
        restore: true,
    }
}

fn snapshot_path() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metrics.json");
    (dir, path)
}

fn read_file(path: &Path) -> Vec<Metric> {
    let mut records: Vec<Metric> = file::read_all(path)
        .unwrap()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    records.sort_by(|a, b| (a.kind.as_str(), &a.id).cmp(&(b.kind.as_str(), &b.id)));
    records
}

#[test]
fn concurrent_counter_sum() {
    let storage = Arc::new(MemoryStorage::new());
    let mut handles = Vec::new();
    for i in 0..8i64 {
        let storage = storage.clone();
        handles.push(std::thread::spawn(move || {
            for _ in 0..500 {
                storage.update_one(&Metric::counter("hits", i + 1)).unwrap();
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
    let expected = (1..=8).sum::<i64>() * 500;
    assert_eq!(
        storage.value_of("hits", MetricKind::Counter).unwrap(),
        Metric::counter("hits", expected)
    );
}

#[test]
fn concurrent_counter_sum_sync_write() {
    let (_dir, path) = snapshot_path();
    let storage = Arc::new(MemoryStorage::open(&sync_config(&path)).unwrap());
    let mut handles = Vec::new();
    for _ in 0..4 {
        let storage = storage.clone();
        handles.push(std::thread::spawn(move || {
            for _ in 0..100 {
                storage.update_one(&Metric::counter("hits", 1)).unwrap();
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
    storage.close().unwrap();

    // the last appended record holds the final total
    let records: Vec<Metric> = file::read_all(&path)
        .unwrap()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records.len(), 400);
    assert_eq!(records.last(), Some(&Metric::counter("hits", 400)));

    let restored = MemoryStorage::open(&sync_config(&path)).unwrap();
    assert_eq!(
        restored.value_of("hits", MetricKind::Counter).unwrap(),
        Metric::counter("hits", 400)
    );
}

#[test]
fn counter_and_gauge_scenario() {
    let storage = MemoryStorage::new();
    storage.update_by_metric(&Metric::counter("requests", 5)).unwrap();
    storage.update_by_metric(&Metric::counter("requests", 3)).unwrap();
    storage.update_by_metric(&Metric::gauge("temp", 19.5)).unwrap();
    storage.update_by_metric(&Metric::gauge("temp", 21.0)).unwrap();

    assert_eq!(
        storage.value_by_metric("requests", MetricKind::Counter).unwrap(),
        Metric::counter("requests", 8)
    );
    assert_eq!(
        storage.value_by_metric("temp", MetricKind::Gauge).unwrap(),
        Metric::gauge("temp", 21.0)
    );
}

#[test]
fn batch_stops_at_first_error() {
    let storage = MemoryStorage::new();
    let mut malformed = Metric::counter("bad", 1);
    malformed.delta = None;
    malformed.value = Some(1.0);

    let r = storage.update_batch(&[
        Metric::counter("first", 1),
        malformed,
        Metric::counter("third", 1),
    ]);
    assert!(r.is_err());
    assert_eq!(
        storage.value_by_metric("first", MetricKind::Counter).unwrap(),
        Metric::counter("first", 1)
    );
    assert!(matches!(
        storage.value_by_metric("third", MetricKind::Counter),
        Err(StoreError::NotFound { .. })
    ));
    assert!(storage.value_by_metric("bad", MetricKind::Counter).is_err());
}

#[test]
fn ping_not_an_outage() {
    let storage = MemoryStorage::new();
    assert!(matches!(
        storage.ping(),
        Err(StoreError::UnsupportedOperation(_))
    ));
    assert!(!health(&storage).is_down());
}

#[test]
fn sync_write_durable() {
    let (_dir, path) = snapshot_path();
    let storage = MemoryStorage::open(&sync_config(&path)).unwrap();
    assert!(storage.sync_write());

    storage.update_one(&Metric::counter("requests", 5)).unwrap();
    // on disk before any close or dump
    assert_eq!(read_file(&path), vec![Metric::counter("requests", 5)]);

    storage.update_one(&Metric::counter("requests", 3)).unwrap();
    storage.update_one(&Metric::gauge("temp", 19.5)).unwrap();
    storage.update_one(&Metric::gauge("temp", 21.0)).unwrap();
    assert_eq!(read_file(&path).len(), 4);
    drop(storage);

    let restored = MemoryStorage::open(&sync_config(&path)).unwrap();
    assert_eq!(
        restored.value_of("requests", MetricKind::Counter).unwrap(),
        Metric::counter("requests", 8)
    );
    assert_eq!(
        restored.value_of("temp", MetricKind::Gauge).unwrap(),
        Metric::gauge("temp", 21.0)
    );
    // the restored state has been rewritten compactly
    assert_eq!(
        read_file(&path),
        vec![Metric::counter("requests", 8), Metric::gauge("temp", 21.0)]
    );
}

#[test]
fn update_after_close() {
    let (_dir, path) = snapshot_path();
    let storage = MemoryStorage::open(&sync_config(&path)).unwrap();
    storage.update_one(&Metric::counter("a", 1)).unwrap();
    storage.close().unwrap();
    storage.close().unwrap();

    assert!(matches!(
        storage.update_one(&Metric::counter("a", 1)),
        Err(StoreError::Io(_))
    ));
    // a failed append leaves the value untouched
    assert_eq!(
        storage.value_of("a", MetricKind::Counter).unwrap(),
        Metric::counter("a", 1)
    );
}

#[test]
fn restore_counter_last_record_wins() {
    let (_dir, path) = snapshot_path();
    fs::write(
        &path,
        "{\"id\":\"a\",\"type\":\"counter\",\"delta\":1}\n\
         {\"id\":\"g\",\"type\":\"gauge\",\"value\":0.5}\n\
         {\"id\":\"a\",\"type\":\"counter\",\"delta\":5}\n\
         {\"id\":\"g\",\"type\":\"gauge\",\"value\":1.5}\n",
    )
    .unwrap();

    let storage = MemoryStorage::open(&periodic_config(&path)).unwrap();
    assert_eq!(
        storage.value_of("a", MetricKind::Counter).unwrap(),
        Metric::counter("a", 5)
    );
    assert_eq!(
        storage.value_of("g", MetricKind::Gauge).unwrap(),
        Metric::gauge("g", 1.5)
    );
}

#[test]
fn restore_idempotent() {
    let (_dir, path) = snapshot_path();
    {
        let storage = MemoryStorage::open(&periodic_config(&path)).unwrap();
        storage.update_one(&Metric::counter("c", 10)).unwrap();
        storage.update_one(&Metric::gauge("g", 0.1)).unwrap();
        storage.dump().unwrap();
        storage.close().unwrap();
    }

    let expected = vec![Metric::counter("c", 10), Metric::gauge("g", 0.1)];
    for _ in 0..3 {
        let storage = MemoryStorage::open(&periodic_config(&path)).unwrap();
        let mut records = storage.snapshot_records();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(records, expected);
        assert_eq!(read_file(&path), expected);
        storage.close().unwrap();
    }
}

#[test]
fn restore_missing_file() {
    let (_dir, path) = snapshot_path();
    let storage = MemoryStorage::open(&periodic_config(&path)).unwrap();
    assert!(storage.snapshot_records().is_empty());
    assert!(path.exists());
}

#[test]
fn restore_corrupt_snapshot() {
    let (_dir, path) = snapshot_path();
    fs::write(
        &path,
        "{\"id\":\"a\",\"type\":\"counter\",\"delta\":1}\n{\"id\":\"a\",\"ty\n",
    )
    .unwrap();

    let Err(e) = MemoryStorage::open(&periodic_config(&path)) else {
        panic!("restore should fail");
    };
    match e {
        StoreError::RestoreFailed { path: p, source } => {
            assert_eq!(p, path);
            assert!(matches!(*source, StoreError::CorruptSnapshot { line: 2, .. }));
        }
        e => panic!("unexpected error {e}"),
    }
    // the snapshot is left as is for inspection
    assert!(fs::read_to_string(&path).unwrap().contains("\"delta\":1"));
}

#[test]
fn restore_disabled() {
    let (_dir, path) = snapshot_path();
    fs::write(&path, "{\"id\":\"a\",\"type\":\"counter\",\"delta\":1}\n").unwrap();

    let config = StoreConfig {
        restore: false,
        ..periodic_config(&path)
    };
    let storage = MemoryStorage::open(&config).unwrap();
    assert!(storage.snapshot_records().is_empty());
    assert!(read_file(&path).is_empty());
}

#[test]
fn periodic_dump_replaces() {
    let (_dir, path) = snapshot_path();
    let storage = MemoryStorage::open(&periodic_config(&path)).unwrap();
    assert!(!storage.sync_write());

    for i in 1..=5 {
        storage.update_one(&Metric::counter("polls", 1)).unwrap();
        storage.update_one(&Metric::gauge("load", i as f64)).unwrap();
        // nothing is written between dumps
        assert_eq!(read_file(&path).len(), if i == 1 { 0 } else { 2 });
        assert_eq!(storage.dump().unwrap(), 2);
        assert_eq!(
            read_file(&path),
            vec![Metric::counter("polls", i), Metric::gauge("load", i as f64)]
        );
    }
}

#[test]
fn memory_only() {
    let storage = MemoryStorage::open(&StoreConfig::default()).unwrap();
    assert!(!storage.has_file());
    storage.update_one(&Metric::counter("a", 1)).unwrap();
    assert_eq!(storage.dump().unwrap(), 0);
    storage.close().unwrap();
}
