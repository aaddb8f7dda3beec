/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use log::warn;
use sysinfo::{Pid, ProcessesToUpdate, System};

use super::{RuntimeStats, StatsSource};

pub struct SysinfoSource {
    system: System,
    pid: Option<Pid>,
}

impl Default for SysinfoSource {
    fn default() -> Self {
        SysinfoSource::new()
    }
}

impl SysinfoSource {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!("failed to get current pid, process stats disabled: {e}");
                None
            }
        };
        SysinfoSource {
            system: System::new(),
            pid,
        }
    }
}

impl StatsSource for SysinfoSource {
    fn collect(&mut self) -> RuntimeStats {
        self.system.refresh_memory();
        self.system.refresh_cpu_usage();

        let mut stats = RuntimeStats {
            total_memory: self.system.total_memory(),
            used_memory: self.system.used_memory(),
            free_memory: self.system.free_memory(),
            available_memory: self.system.available_memory(),
            total_swap: self.system.total_swap(),
            used_swap: self.system.used_swap(),
            free_swap: self.system.free_swap(),
            global_cpu_usage: self.system.global_cpu_usage(),
            cpu_usage: self.system.cpus().iter().map(|c| c.cpu_usage()).collect(),
            uptime: System::uptime(),
            ..Default::default()
        };

        let load = System::load_average();
        stats.load_average_one = load.one;
        stats.load_average_five = load.five;
        stats.load_average_fifteen = load.fifteen;

        if let Some(pid) = self.pid {
            self.system
                .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
            if let Some(process) = self.system.process(pid) {
                stats.process_memory = process.memory();
                stats.process_virtual_memory = process.virtual_memory();
                stats.process_cpu_usage = process.cpu_usage();
                stats.process_run_time = process.run_time();
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect() {
        let mut source = SysinfoSource::new();
        let stats = source.collect();
        assert!(stats.used_memory <= stats.total_memory);
        assert_eq!(stats.cpu_usage.len(), source.system.cpus().len());
    }
}
