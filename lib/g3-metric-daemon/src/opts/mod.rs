/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod config;
pub use config::{config_dir, config_file, validate_and_set_config_file};

mod daemon;
pub use daemon::{DaemonArgs, DaemonArgsExt};
