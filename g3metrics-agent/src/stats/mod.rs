/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::HashSet;

use log::debug;

mod system;
pub use system::SysinfoSource;

/// One sample of process and system statistics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuntimeStats {
    pub process_memory: u64,
    pub process_virtual_memory: u64,
    pub process_cpu_usage: f32,
    pub process_run_time: u64,
    pub total_memory: u64,
    pub used_memory: u64,
    pub free_memory: u64,
    pub available_memory: u64,
    pub total_swap: u64,
    pub used_swap: u64,
    pub free_swap: u64,
    pub global_cpu_usage: f32,
    pub cpu_usage: Vec<f32>,
    pub load_average_one: f64,
    pub load_average_five: f64,
    pub load_average_fifteen: f64,
    pub uptime: u64,
}

type FieldGetter = fn(&RuntimeStats) -> f64;

/// Named numeric fields reported as gauges, in report order.
pub const STATIC_FIELDS: &[(&str, FieldGetter)] = &[
    ("ProcessMemory", |s| s.process_memory as f64),
    ("ProcessVirtualMemory", |s| s.process_virtual_memory as f64),
    ("ProcessCPUUsage", |s| s.process_cpu_usage as f64),
    ("ProcessRunTime", |s| s.process_run_time as f64),
    ("TotalMemory", |s| s.total_memory as f64),
    ("UsedMemory", |s| s.used_memory as f64),
    ("FreeMemory", |s| s.free_memory as f64),
    ("AvailableMemory", |s| s.available_memory as f64),
    ("TotalSwap", |s| s.total_swap as f64),
    ("UsedSwap", |s| s.used_swap as f64),
    ("FreeSwap", |s| s.free_swap as f64),
    ("CPUUsage", |s| s.global_cpu_usage as f64),
    ("LoadAverage1", |s| s.load_average_one),
    ("LoadAverage5", |s| s.load_average_five),
    ("LoadAverage15", |s| s.load_average_fifteen),
    ("Uptime", |s| s.uptime as f64),
];

pub const PER_CPU_FIELD_PREFIX: &str = "CPUutilization";

pub const DEFAULT_EXCLUDED_FIELDS: &[&str] = &["ProcessVirtualMemory"];

fn push_finite(values: &mut Vec<(String, f64)>, name: String, value: f64) {
    if value.is_finite() {
        values.push((name, value));
    } else {
        debug!("skip non finite value {value} of field {name}");
    }
}

/// Map a sample to the gauges to report, skipping `excluded` field names.
///
/// Per core usage is named with a 1 based core index. NaN and infinite
/// readings are left out.
pub fn gauges(stats: &RuntimeStats, excluded: &HashSet<String>) -> Vec<(String, f64)> {
    let mut values = Vec::with_capacity(STATIC_FIELDS.len() + stats.cpu_usage.len());
    for (name, getter) in STATIC_FIELDS {
        if excluded.contains(*name) {
            continue;
        }
        push_finite(&mut values, name.to_string(), getter(stats));
    }
    for (i, usage) in stats.cpu_usage.iter().enumerate() {
        let name = format!("{PER_CPU_FIELD_PREFIX}{}", i + 1);
        if excluded.contains(&name) {
            continue;
        }
        push_finite(&mut values, name, *usage as f64);
    }
    values
}

pub trait StatsSource: Send + 'static {
    fn collect(&mut self) -> RuntimeStats;
}
