/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use anyhow::Context;

pub mod agent;
pub mod config;
pub mod opts;
pub mod signal;
pub mod stats;
pub mod transport;

mod build;

use config::AgentConfig;
use stats::SysinfoSource;
use transport::UdpSender;

pub async fn run(config: &AgentConfig) -> anyhow::Result<()> {
    signal::register().context("failed to setup signal handler")?;

    let sender = Arc::new(UdpSender::new(config.server, config.request_timeout));
    let quit = g3_metric_daemon::quit::process().waiter();
    agent::run(config, SysinfoSource::new(), sender, quit).await;
    Ok(())
}
