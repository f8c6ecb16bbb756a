//! Configuration loading and validation.
//!
//! Values are layered, later sources overriding earlier ones:
//!
//! 1. built-in defaults,
//! 2. a configuration file (an explicit path, or `config.{toml,yaml,json}` in
//!    the platform configuration directory),
//! 3. environment variables prefixed with `LECTIO_`, with `__` separating
//!    nested keys (`LECTIO_CACHE__MAX_ENTRIES=200`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use lectio_cache::CacheSettings;
use lectio_cache::provider::{Endpoint, ResponseFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "LECTIO_";
const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub distribution: DistributionConfig,
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the persisted state.
    pub path: PathBuf,
    /// Read persisted state but never write it.
    pub read_only: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let path = match project_dirs() {
            Some(dirs) => dirs.data_dir().to_path_buf(),
            None => std::env::temp_dir().join("lectio"),
        };
        Self { path, read_only: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub ttl_days: u64,
    pub fetch_timeout_secs: u64,
    pub key: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 500,
            ttl_days: 30,
            fetch_timeout_secs: 10,
            key: lectio_cache::DEFAULT_CACHE_KEY.to_string(),
        }
    }
}

impl CacheConfig {
    pub fn settings(&self) -> CacheSettings {
        CacheSettings {
            max_entries: self.max_entries,
            ttl: Duration::from_secs(self.ttl_days.saturating_mul(SECONDS_PER_DAY)),
            fetch_timeout: self.fetch_timeout(),
            key: self.key.clone(),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// References served per batch.
    pub batch_size: usize,
    pub state_key: String,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            batch_size: 2,
            state_key: lectio_distribute::DEFAULT_STATE_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Translation requested from the endpoints.
    pub version: String,
    /// Tried in order until one yields text.
    pub endpoints: Vec<Endpoint>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            version: "KJV".to_string(),
            endpoints: vec![
                Endpoint::new(
                    "bible-api",
                    "https://bible-api.com/{reference}?translation={version}",
                    ResponseFormat::Passage,
                ),
                Endpoint::new(
                    "bible-api-chapter",
                    "https://bible-api.com/{book}%20{chapter}?translation={version}",
                    ResponseFormat::VerseList,
                ),
            ],
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "lectio")
}

impl Config {
    /// Load from every layer and validate.
    ///
    /// With `explicit` set, that file must exist and replaces discovery in the
    /// platform configuration directory.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(explicit)?)
    }

    /// The layered sources, without extracting them.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match explicit {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
                }
                figment = merge_file(figment, path)?;
            },
            None => {
                if let Some(dirs) = project_dirs() {
                    let dir = dirs.config_dir();
                    figment = figment
                        .merge(Toml::file(dir.join("config.toml")))
                        .merge(Yaml::file(dir.join("config.yaml")))
                        .merge(Json::file(dir.join("config.json")));
                }
            },
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(storage = %config.storage.path.display(), endpoints = config.provider.endpoints.len(), "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.storage.path.is_absolute() {
            exn::bail!(ErrorKind::Invalid("storage.path"));
        }
        if self.cache.max_entries == 0 {
            exn::bail!(ErrorKind::Invalid("cache.max_entries"));
        }
        if self.cache.ttl_days == 0 {
            exn::bail!(ErrorKind::Invalid("cache.ttl_days"));
        }
        if self.cache.fetch_timeout_secs == 0 {
            exn::bail!(ErrorKind::Invalid("cache.fetch_timeout_secs"));
        }
        lectio_storage::validate_key(&self.cache.key).or_raise(|| ErrorKind::Invalid("cache.key"))?;
        if self.distribution.batch_size == 0 {
            exn::bail!(ErrorKind::Invalid("distribution.batch_size"));
        }
        lectio_storage::validate_key(&self.distribution.state_key)
            .or_raise(|| ErrorKind::Invalid("distribution.state_key"))?;
        if self.distribution.state_key == self.cache.key {
            exn::bail!(ErrorKind::Invalid("distribution.state_key"));
        }
        if self.provider.version.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("provider.version"));
        }
        if self.provider.endpoints.is_empty() {
            exn::bail!(ErrorKind::Invalid("provider.endpoints"));
        }
        for endpoint in &self.provider.endpoints {
            endpoint.validate().or_raise(|| ErrorKind::Invalid("provider.endpoints"))?;
        }
        Ok(())
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|extension| extension.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}
