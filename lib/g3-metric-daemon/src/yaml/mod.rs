/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::Path;

use anyhow::{Context, anyhow};
use yaml_rust::{Yaml, YamlLoader, yaml};

pub mod humanize;
pub mod key;
pub mod value;

pub fn foreach_kv<F>(table: &yaml::Hash, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&str, &Yaml) -> anyhow::Result<()>,
{
    for (k, v) in table.iter() {
        if let Yaml::String(key) = k {
            f(key, v).context(format!("failed to parse value of key {key}"))?;
        } else {
            return Err(anyhow!("key in hash should be string"));
        }
    }
    Ok(())
}

pub fn load_str(content: &str) -> anyhow::Result<Vec<Yaml>> {
    YamlLoader::load_from_str(content).map_err(|e| anyhow!("invalid yaml content: {e}"))
}

/// Load the yaml file at `path` and call `f` on each document in it.
pub fn foreach_doc<F>(path: &Path, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(usize, &Yaml) -> anyhow::Result<()>,
{
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read in file {}: {e}", path.display()))?;
    let docs = load_str(&content).context(format!("failed to load file {}", path.display()))?;
    for (i, doc) in docs.iter().enumerate() {
        f(i, doc).context(format!("failed to parse doc #{i} in {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreach_kv_ok() {
        let docs = load_str("a: 1\nb: 2").unwrap();
        let hash = docs[0].as_hash().unwrap();
        let mut result = Vec::new();
        foreach_kv(hash, |k, v| {
            result.push((k.to_owned(), v.as_i64().unwrap()));
            Ok(())
        })
        .unwrap();
        assert_eq!(result, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
    }

    #[test]
    fn foreach_kv_err() {
        let docs = load_str("123: 1").unwrap();
        let hash = docs[0].as_hash().unwrap();
        assert!(foreach_kv(hash, |_, _| Ok(())).is_err());

        let docs = load_str("a: 1").unwrap();
        let hash = docs[0].as_hash().unwrap();
        assert!(foreach_kv(hash, |k, _| Err(anyhow!("error at {k}"))).is_err());
    }

    #[test]
    fn foreach_doc_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.yaml");
        std::fs::write(&path, "a: 1\n---\nb: 2\n").unwrap();
        let mut count = 0;
        foreach_doc(&path, |_, doc| {
            assert!(doc.as_hash().is_some());
            count += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 2);

        assert!(foreach_doc(&dir.path().join("none.yaml"), |_, _| Ok(())).is_err());
    }
}
