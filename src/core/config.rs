use crate::core::asset::Asset;
use crate::core::quote::CachePolicy;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_FUNKIT_BASE_URL: &str = "https://api.fun.xyz/v1";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FunkitProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProvidersConfig {
    pub funkit: Option<FunkitProviderConfig>,
}

impl Default for FunkitProviderConfig {
    fn default() -> Self {
        FunkitProviderConfig {
            base_url: DEFAULT_FUNKIT_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            funkit: Some(FunkitProviderConfig::default()),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "default_metadata_stale_secs")]
    pub metadata_stale_secs: u64,
    #[serde(default)]
    pub price_stale_secs: u64,
}

fn default_metadata_stale_secs() -> u64 {
    600
}

fn default_debounce_ms() -> u64 {
    400
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            metadata_stale_secs: default_metadata_stale_secs(),
            price_stale_secs: 0,
        }
    }
}

impl From<&CacheConfig> for CachePolicy {
    fn from(config: &CacheConfig) -> Self {
        CachePolicy {
            metadata_stale_time: Duration::from_secs(config.metadata_stale_secs),
            price_stale_time: Duration::from_secs(config.price_stale_secs),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Catalog override; the built-in asset list is used when absent.
    #[serde(default)]
    pub assets: Option<Vec<Asset>>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            assets: None,
            providers: ProvidersConfig::default(),
            cache: CacheConfig::default(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl AppConfig {
    /// Loads the default config file, falling back to built-in defaults when
    /// it does not exist yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "quotecast", "quotecast")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy::from(&self.cache)
    }
}
