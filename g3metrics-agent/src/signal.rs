/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use g3_metric_daemon::signal::AsyncSignalAction;

#[derive(Clone, Copy)]
struct QuitAction {}

impl AsyncSignalAction for QuitAction {
    async fn run(&self) {
        g3_metric_daemon::quit::trigger_process_quit();
    }
}

pub fn register() -> anyhow::Result<()> {
    #[cfg(unix)]
    g3_metric_daemon::signal::register_offline(QuitAction {})?;
    g3_metric_daemon::signal::register_quit(QuitAction {})
}
