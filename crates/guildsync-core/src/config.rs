//! Application configuration management.
//!
//! Configuration is stored at `~/.config/guildsync/config.json` and can be
//! overridden per run with `GUILDSYNC_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/storage directory paths
const APP_NAME: &str = "guildsync";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Where the site's static JSON files live when nothing else is configured
const DEFAULT_REMOTE_BASE: &str = "./data";

const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;

const ENV_REMOTE_BASE: &str = "GUILDSYNC_REMOTE_BASE";
const ENV_STORAGE_DIR: &str = "GUILDSYNC_STORAGE_DIR";
const ENV_CACHE_TTL_SECS: &str = "GUILDSYNC_CACHE_TTL_SECS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `http(s)://` URL or directory holding `photos.json` and `members.json`
    pub remote_base: String,
    pub storage_dir: Option<PathBuf>,
    pub cache_ttl_secs: u64,
    /// No timeout when unset
    pub request_timeout_secs: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_base: DEFAULT_REMOTE_BASE.to_string(),
            storage_dir: None,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            request_timeout_secs: None,
            log_file: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply `GUILDSYNC_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(base) = lookup(ENV_REMOTE_BASE) {
            self.remote_base = base;
        }
        if let Some(dir) = lookup(ENV_STORAGE_DIR) {
            self.storage_dir = Some(PathBuf::from(dir));
        }
        if let Some(ttl) = lookup(ENV_CACHE_TTL_SECS) {
            self.cache_ttl_secs = ttl
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of seconds, got {:?}", ENV_CACHE_TTL_SECS, ttl))?;
        }
        Ok(())
    }

    /// Directory for the local persistent store.
    pub fn storage_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.storage_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find local data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
