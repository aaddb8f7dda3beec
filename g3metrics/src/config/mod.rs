/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::path::Path;

use anyhow::anyhow;
use yaml_rust::{Yaml, yaml};

use g3_metric_daemon::yaml as g3_yaml;

mod store;
pub use store::StoreConfig;

pub const DEFAULT_LISTEN_ADDR: SocketAddr =
    SocketAddr::V4(std::net::SocketAddrV4::new(std::net::Ipv4Addr::LOCALHOST, 8125));

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub store: StoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen: DEFAULT_LISTEN_ADDR,
            store: StoreConfig::default(),
        }
    }
}

pub fn load() -> anyhow::Result<ServerConfig> {
    let config_file = g3_metric_daemon::opts::config_file()
        .ok_or_else(|| anyhow!("no config file set"))?;
    let conf_dir = g3_metric_daemon::opts::config_dir();

    let mut config = ServerConfig::default();
    // allow multiple docs, and treat them as the same
    g3_yaml::foreach_doc(config_file, |_, doc| load_doc(&mut config, doc, conf_dir))?;
    Ok(config)
}

fn load_doc(config: &mut ServerConfig, doc: &Yaml, conf_dir: Option<&Path>) -> anyhow::Result<()> {
    match doc {
        Yaml::Hash(map) => load_map(config, map, conf_dir),
        _ => Err(anyhow!("yaml doc root should be hash")),
    }
}

fn load_map(
    config: &mut ServerConfig,
    map: &yaml::Hash,
    conf_dir: Option<&Path>,
) -> anyhow::Result<()> {
    g3_yaml::foreach_kv(map, |k, v| match g3_yaml::key::normalize(k).as_str() {
        "listen" | "address" => {
            config.listen = g3_yaml::value::as_sockaddr(v)?;
            Ok(())
        }
        "store" => {
            config.store = StoreConfig::parse(v, conf_dir)?;
            Ok(())
        }
        _ => Err(anyhow!("invalid key {k} in main conf")),
    })
}
