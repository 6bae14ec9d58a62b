//! Configuration loading
//!
//! Resolution order for the config file path:
//! 1. Command-line argument (highest priority)
//! 2. `LOYAL_CONFIG` environment variable
//! 3. `<config_dir>/loyal-finder/config.toml`
//!
//! A missing default config file is not fatal: a warning is logged and the
//! compiled defaults are used. Individual values can then be overridden by
//! environment variables (`LOYAL_BIND_ADDR`, `LOYAL_STORE_URL`,
//! `LOYAL_STORE_KEY`) and finally by command-line flags in the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::geo::RegionBounds;
use crate::store::PEOPLE_TABLE;
use crate::{Error, Result};

pub const CONFIG_ENV: &str = "LOYAL_CONFIG";
pub const BIND_ADDR_ENV: &str = "LOYAL_BIND_ADDR";
pub const STORE_URL_ENV: &str = "LOYAL_STORE_URL";
pub const STORE_KEY_ENV: &str = "LOYAL_STORE_KEY";

const APP_DIR: &str = "loyal-finder";

/// Which [`crate::PersonStore`] implementation to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Rest,
    Sqlite,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rest" => Ok(StoreBackend::Rest),
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!(
                "unknown store backend '{}' (expected rest, sqlite or memory)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Project URL for the rest backend
    pub url: Option<String>,
    /// Anonymous API key for the rest backend
    pub api_key: Option<String>,
    pub table: String,
    /// Database file for the sqlite backend
    pub database_path: PathBuf,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            url: None,
            api_key: None,
            table: PEOPLE_TABLE.to_string(),
            database_path: default_data_dir().join("people.db"),
            timeout_secs: 15,
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "loyal_map=info,loyal_common=info,tower_http=info".to_string(),
        }
    }
}

/// Contents of `config.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub bind_addr: String,
    pub store: StoreConfig,
    pub region: RegionBounds,
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5780".to_string(),
            store: StoreConfig::default(),
            region: RegionBounds::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        self.region.validate().map_err(Error::Config)?;

        if self.store.timeout_secs == 0 {
            return Err(Error::Config("store.timeout_secs must be positive".to_string()));
        }
        if self.store.table.trim().is_empty() {
            return Err(Error::Config("store.table must not be empty".to_string()));
        }
        if self.store.backend == StoreBackend::Rest
            && self.store.url.as_deref().map_or(true, |u| u.trim().is_empty())
        {
            return Err(Error::Config(
                "store.url is required when store.backend = \"rest\"".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply `LOYAL_BIND_ADDR`, `LOYAL_STORE_URL` and `LOYAL_STORE_KEY`
    ///
    /// Setting a store URL switches the backend to `rest`.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(addr) = std::env::var(BIND_ADDR_ENV) {
            self.bind_addr = addr;
        }
        if let Ok(url) = std::env::var(STORE_URL_ENV) {
            self.store.url = Some(url);
            self.store.backend = StoreBackend::Rest;
        }
        if let Ok(key) = std::env::var(STORE_KEY_ENV) {
            self.store.api_key = Some(key);
        }
        self.validate()
    }
}

/// Locates and loads the config file following the documented priority
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Path chosen by priority, and whether it was requested explicitly
    pub fn config_path(&self) -> Option<(PathBuf, bool)> {
        if let Some(path) = &self.cli_path {
            return Some((path.clone(), true));
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some((PathBuf::from(path), true));
        }
        default_config_path().map(|p| (p, false))
    }

    /// Load config; an explicitly requested file must exist
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match self.config_path() {
            Some((path, _)) if path.exists() => {
                info!("Loading config from {}", path.display());
                TomlConfig::load(&path)?
            }
            Some((path, true)) => {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            Some((path, false)) => {
                warn!(
                    "No config file at {}; using compiled defaults",
                    path.display()
                );
                TomlConfig::default()
            }
            None => {
                warn!("Could not determine config directory; using compiled defaults");
                TomlConfig::default()
            }
        };

        config.apply_env_overrides()?;
        Ok(config)
    }
}

/// `<config_dir>/loyal-finder/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// OS-dependent data folder for the sqlite backend
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./loyal_finder_data"))
}
