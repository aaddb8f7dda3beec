/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::num::NonZeroUsize;
use std::time::Duration;

use anyhow::{Context, anyhow};
use yaml_rust::{Yaml, yaml};

use g3_metric_daemon::yaml as g3_yaml;

use crate::stats::DEFAULT_EXCLUDED_FIELDS;

const DEFAULT_SERVER_ADDR: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 8125));

#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub server: SocketAddr,
    pub poll_interval: Duration,
    pub report_interval: Duration,
    pub rate_limit: NonZeroUsize,
    pub batch: bool,
    pub request_timeout: Duration,
    pub excluded_fields: HashSet<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            server: DEFAULT_SERVER_ADDR,
            poll_interval: Duration::from_secs(2),
            report_interval: Duration::from_secs(10),
            rate_limit: NonZeroUsize::MIN,
            batch: false,
            request_timeout: Duration::from_secs(5),
            excluded_fields: DEFAULT_EXCLUDED_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl AgentConfig {
    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match g3_yaml::key::normalize(k).as_str() {
            "server" | "address" => {
                self.server = g3_yaml::value::as_sockaddr(v)?;
                Ok(())
            }
            "poll_interval" => {
                self.poll_interval = g3_yaml::humanize::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                Ok(())
            }
            "report_interval" => {
                self.report_interval = g3_yaml::humanize::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                Ok(())
            }
            "rate_limit" => {
                self.rate_limit = g3_yaml::value::as_nonzero_usize(v)?;
                Ok(())
            }
            "batch" => {
                self.batch = g3_yaml::value::as_bool(v)?;
                Ok(())
            }
            "request_timeout" => {
                self.request_timeout = g3_yaml::humanize::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                Ok(())
            }
            "exclude" | "excluded_fields" => {
                let fields = g3_yaml::value::as_list(v, g3_yaml::value::as_string)?;
                self.excluded_fields = fields.into_iter().collect();
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k} in main conf")),
        }
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.poll_interval.is_zero() {
            return Err(anyhow!("poll interval should not be zero"));
        }
        if self.report_interval.is_zero() {
            return Err(anyhow!("report interval should not be zero"));
        }
        if self.request_timeout.is_zero() {
            return Err(anyhow!("request timeout should not be zero"));
        }
        Ok(())
    }

    fn load_doc(&mut self, doc: &Yaml) -> anyhow::Result<()> {
        match doc {
            Yaml::Hash(map) => self.load_map(map),
            _ => Err(anyhow!("yaml doc root should be hash")),
        }
    }

    fn load_map(&mut self, map: &yaml::Hash) -> anyhow::Result<()> {
        g3_yaml::foreach_kv(map, |k, v| self.set(k, v))
    }
}

pub fn load() -> anyhow::Result<AgentConfig> {
    let config_file = g3_metric_daemon::opts::config_file()
        .ok_or_else(|| anyhow!("no config file set"))?;

    let mut config = AgentConfig::default();
    // allow multiple docs, and treat them as the same
    g3_yaml::foreach_doc(config_file, |_, doc| config.load_doc(doc))?;
    config.check()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_str(s: &str) -> anyhow::Result<AgentConfig> {
        let mut config = AgentConfig::default();
        for doc in g3_yaml::load_str(s)? {
            config.load_doc(&doc)?;
        }
        config.check()?;
        Ok(config)
    }

    #[test]
    fn default() {
        let config = load_str("{}").unwrap();
        assert_eq!(config.server, DEFAULT_SERVER_ADDR);
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.report_interval, Duration::from_secs(10));
        assert_eq!(config.rate_limit.get(), 1);
        assert!(!config.batch);
        assert!(config.excluded_fields.contains("ProcessVirtualMemory"));
    }

    #[test]
    fn full() {
        let config = load_str(
            "server: 10.0.0.1:9125\npoll-interval: 500ms\nreport_interval: 1m\nrate_limit: 4\nbatch: true\nrequest_timeout: 2\nexclude:\n  - Uptime\n  - FreeSwap\n",
        )
        .unwrap();
        assert_eq!(config.server, "10.0.0.1:9125".parse().unwrap());
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.report_interval, Duration::from_secs(60));
        assert_eq!(config.rate_limit.get(), 4);
        assert!(config.batch);
        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert_eq!(config.excluded_fields.len(), 2);
        assert!(config.excluded_fields.contains("Uptime"));
        assert!(!config.excluded_fields.contains("ProcessVirtualMemory"));
    }

    #[test]
    fn invalid() {
        assert!(load_str("rate_limit: 0\n").is_err());
        assert!(load_str("poll_interval: 0\n").is_err());
        assert!(load_str("server: localhost\n").is_err());
        assert!(load_str("listen: 127.0.0.1:8125\n").is_err());
        assert!(load_str("[]").is_err());
    }
}
