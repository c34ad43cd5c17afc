//! CLI configuration.
//!
//! Configuration is read from TOML, either the file given with `--config`
//! or `~/.config/shortfs/config.toml` when it exists. It is never written.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use shortfs_chain::ChainConfig;

/// CLI configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the short-link service.
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Chain layout and retry pacing.
    #[serde(default)]
    pub chain: ChainConfig,
}

fn default_service_url() -> String {
    shortfs_itomx::DEFAULT_BASE_URL.into()
}

fn default_timeout_secs() -> u64 {
    shortfs_itomx::DEFAULT_TIMEOUT.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            timeout_secs: default_timeout_secs(),
            chain: ChainConfig::default(),
        }
    }
}

impl Config {
    /// Loads `explicit` if given, else the default file if present, else
    /// built-in defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Parses the TOML file at `path`.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.chain.validate()?;

        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Returns the default configuration file path, if a home directory is set.
fn config_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let base = std::env::var_os("APPDATA").map(PathBuf::from);

    #[cfg(not(target_os = "windows"))]
    let base = std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"));

    base.map(|dir| dir.join("shortfs").join("config.toml"))
}
