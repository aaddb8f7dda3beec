/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::anyhow;

static CONFIG_FILE_PATH: OnceLock<PathBuf> = OnceLock::new();
static CONFIG_DIR_PATH: OnceLock<PathBuf> = OnceLock::new();

fn guess_config_file(dir: &Path, program_name: &str) -> anyhow::Result<PathBuf> {
    const GUESS_EXT: &[&str] = &["yml", "yaml", "conf"];

    let rdir = dir
        .read_dir()
        .map_err(|e| anyhow!("failed to open {}: {e}", dir.display()))?;
    for v in rdir {
        let Ok(v) = v else {
            continue;
        };
        let path = v.path();
        for ext in GUESS_EXT {
            if path.ends_with(format!("main.{ext}")) {
                return Ok(path);
            }
            if path.ends_with(format!("{program_name}.{ext}")) {
                return Ok(path);
            }
        }
    }
    Err(anyhow!(
        "no main config file found in dir {}",
        dir.display()
    ))
}

pub(crate) fn validate_config_file(path: &Path, program_name: &str) -> anyhow::Result<PathBuf> {
    let metadata = fs::metadata(path)
        .map_err(|e| anyhow!("failed to get metadata of path {}: {e}", path.display()))?;

    let mut path = if metadata.is_dir() {
        guess_config_file(path, program_name)?
    } else {
        path.to_path_buf()
    };

    if !path.is_absolute() {
        let cur_dir =
            std::env::current_dir().map_err(|e| anyhow!("failed to get current dir: {e}"))?;
        path = cur_dir.join(path);
    }
    path.canonicalize()
        .map_err(|e| anyhow!("failed to canonicalize path: {e}"))
}

pub fn validate_and_set_config_file(path: &Path, program_name: &str) -> anyhow::Result<()> {
    let config_file = validate_config_file(path, program_name)?;

    let current_dir = std::env::current_dir()?;
    let conf_dir = config_file.parent().unwrap_or(&current_dir).to_path_buf();

    CONFIG_FILE_PATH
        .set(config_file)
        .map_err(|_| anyhow!("config file has already been set"))?;
    CONFIG_DIR_PATH
        .set(conf_dir)
        .map_err(|_| anyhow!("config dir has already been set"))?;
    Ok(())
}

pub fn config_file() -> Option<&'static Path> {
    CONFIG_FILE_PATH.get().map(|d| d.as_path())
}

pub fn config_dir() -> Option<&'static Path> {
    CONFIG_DIR_PATH.get().map(|d| d.as_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guess_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("other.yaml"), "").unwrap();
        assert!(validate_config_file(dir.path(), "g3metrics").is_err());

        fs::write(dir.path().join("g3metrics.yaml"), "").unwrap();
        let path = validate_config_file(dir.path(), "g3metrics").unwrap();
        assert!(path.ends_with("g3metrics.yaml"));
        assert!(path.is_absolute());
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_config_file(&dir.path().join("none.yaml"), "x").is_err());
    }
}
