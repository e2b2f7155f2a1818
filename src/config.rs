use crate::constants::{DEFAULT_BASE_REVISION, DEFAULT_HOST_BIN, DEFAULT_SWARM_PREFIX};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Default)]
struct PartialConfig {
    host_bin: Option<String>,
    default_base: Option<String>,
    swarm_prefix: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct Config {
    /// Session host CLI binary invoked for session create/fork/title/UI.
    pub(crate) host_bin: String,
    /// Base ref used when creating a branch without an explicit `--base`.
    pub(crate) default_base: String,
    /// Branch prefix applied to swarm task names.
    pub(crate) swarm_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host_bin: DEFAULT_HOST_BIN.to_string(),
            default_base: DEFAULT_BASE_REVISION.to_string(),
            swarm_prefix: DEFAULT_SWARM_PREFIX.to_string(),
        }
    }
}

impl Config {
    pub(crate) fn load() -> Result<Self> {
        let mut config = Self::default();
        for path in config_paths() {
            if !path.exists() {
                continue;
            }
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            let parsed: PartialConfig = toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file {}", path.display()))?;
            if let Some(host_bin) = parsed.host_bin.filter(|value| !value.trim().is_empty()) {
                config.host_bin = host_bin;
            }
            if let Some(base) = parsed.default_base.filter(|value| !value.trim().is_empty()) {
                config.default_base = base;
            }
            if let Some(prefix) = parsed.swarm_prefix.filter(|value| !value.trim().is_empty()) {
                config.swarm_prefix = prefix;
            }
            break;
        }
        Ok(config)
    }
}

fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("opentrees").join("config.toml"));
    }
    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".opentrees.toml"));
    }
    paths
}
