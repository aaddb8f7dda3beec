/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

use g3_metric_daemon::yaml;

const DEFAULT_STORE_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub file_path: Option<PathBuf>,
    pub store_interval: Duration,
    pub restore: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            file_path: None,
            store_interval: DEFAULT_STORE_INTERVAL,
            restore: true,
        }
    }
}

impl StoreConfig {
    /// Every update is appended to the snapshot file before it returns.
    #[inline]
    pub fn sync_write(&self) -> bool {
        self.file_path.is_some() && self.store_interval.is_zero()
    }

    /// The periodic dump interval, if there is anything to dump to.
    pub fn dump_interval(&self) -> Option<Duration> {
        if self.file_path.is_some() && !self.store_interval.is_zero() {
            Some(self.store_interval)
        } else {
            None
        }
    }

    pub(crate) fn parse(v: &Yaml, conf_dir: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = StoreConfig::default();
        match v {
            Yaml::Hash(map) => {
                yaml::foreach_kv(map, |k, v| config.set(k, v, conf_dir))?;
            }
            Yaml::String(_) => {
                config.file_path = Some(yaml::value::as_file_path(v, conf_dir)?);
            }
            Yaml::Null => {}
            _ => return Err(anyhow!("invalid yaml value type for store config")),
        }
        Ok(config)
    }

    fn set(&mut self, k: &str, v: &Yaml, conf_dir: Option<&Path>) -> anyhow::Result<()> {
        match yaml::key::normalize(k).as_str() {
            "file_storage_path" | "path" => {
                let path = yaml::value::as_file_path(v, conf_dir)
                    .context(format!("invalid file path value for key {k}"))?;
                self.file_path = Some(path);
                Ok(())
            }
            "store_interval" | "interval" => {
                self.store_interval = yaml::humanize::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                Ok(())
            }
            "restore" => {
                self.restore = yaml::value::as_bool(v)?;
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        }
    }
}
