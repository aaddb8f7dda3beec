/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::thread::JoinHandle;

use anyhow::anyhow;
use slog::{Drain, slog_o};
use slog_scope::GlobalLoggerGuard;

use crate::opts::DaemonArgs;

mod stdio;

const PROCESS_LOG_THREAD_NAME: &str = "log-process";
const PROCESS_LOG_CHANNEL_CAPACITY: usize = 1024;

/// Keeps the process logger alive.
///
/// Dropping the guard resets the global logger and waits for the io thread
/// to drain the pending records.
pub struct ProcessLogGuard {
    scope_guard: Option<GlobalLoggerGuard>,
    io_thread: Option<JoinHandle<()>>,
}

impl Drop for ProcessLogGuard {
    fn drop(&mut self) {
        self.scope_guard.take();
        if let Some(handle) = self.io_thread.take() {
            let _ = handle.join();
        }
    }
}

fn verbose_log_level(verbose_level: u8) -> log::Level {
    match verbose_level {
        0 => log::Level::Warn,
        1 => log::Level::Info,
        2 => log::Level::Debug,
        _ => log::Level::Trace,
    }
}

pub fn setup(args: &DaemonArgs) -> anyhow::Result<ProcessLogGuard> {
    let (drain, io_thread) =
        stdio::spawn_async_logger(PROCESS_LOG_THREAD_NAME, PROCESS_LOG_CHANNEL_CAPACITY, true)
            .map_err(|e| anyhow!("failed to spawn log io thread: {e}"))?;
    let logger = slog::Logger::root(drain.fuse(), slog_o!("process" => args.process_name));

    let scope_guard = slog_scope::set_global_logger(logger);

    slog_stdlog::init_with_level(verbose_log_level(args.verbose_level))
        .map_err(|e| anyhow!("failed to set std logger: {e}"))?;
    Ok(ProcessLogGuard {
        scope_guard: Some(scope_guard),
        io_thread: Some(io_thread),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level() {
        assert_eq!(verbose_log_level(0), log::Level::Warn);
        assert_eq!(verbose_log_level(1), log::Level::Info);
        assert_eq!(verbose_log_level(2), log::Level::Debug);
        assert_eq!(verbose_log_level(3), log::Level::Trace);
        assert_eq!(verbose_log_level(9), log::Level::Trace);
    }
}
