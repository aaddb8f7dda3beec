/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::Context;
use log::{debug, error, info};

fn main() -> anyhow::Result<()> {
    let Some(proc_args) =
        g3metrics_agent::opts::parse_clap().context("failed to parse command line options")?
    else {
        return Ok(());
    };

    // set up process logger early, only proc args is used inside
    let _log_guard = g3_metric_daemon::log::setup(&proc_args.daemon_config)
        .context("failed to setup logger")?;

    let config = g3metrics_agent::config::load()
        .context(format!("failed to load config, opts: {:?}", &proc_args))?;
    debug!("loaded config: {config:?}");

    if proc_args.daemon_config.test_config {
        info!("the format of the config file is ok");
        return Ok(());
    }

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    let ret = rt.block_on(g3metrics_agent::run(&config));

    match ret {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("{e:?}");
            Err(e)
        }
    }
}
