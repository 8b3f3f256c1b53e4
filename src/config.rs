use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default)]
    pub log_filter: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TwelveLabsFileConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub marengo_index_id: Option<String>,
    #[serde(default)]
    pub pegasus_index_id: Option<String>,
    #[serde(default)]
    pub page_limit: Option<u32>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StorageFileConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClientFileConfig {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: Option<ServerConfig>,
    #[serde(default)]
    pub twelvelabs: TwelveLabsFileConfig,
    #[serde(default)]
    pub storage: StorageFileConfig,
    #[serde(default)]
    pub client: ClientFileConfig,
}

/// Twelve Labs access settings. Only presence is checked, never validity.
#[derive(Clone, Debug)]
pub struct TwelveLabsConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub marengo_index_id: Option<String>,
    pub pegasus_index_id: Option<String>,
    pub page_limit: u32,
}

/// Index identifiers resolved once the credential check has passed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexPair {
    pub primary: String,
    pub secondary: String,
}

impl TwelveLabsConfig {
    /// Checks the credential first, then both index ids. Runs before any
    /// network call so a misconfiguration never looks like a fetch failure.
    pub fn require(&self) -> Result<IndexPair, ConfigError> {
        if self.api_key.is_none() {
            return Err(ConfigError::MissingApiKey);
        }

        match (&self.marengo_index_id, &self.pegasus_index_id) {
            (Some(primary), Some(secondary)) => Ok(IndexPair {
                primary: primary.clone(),
                secondary: secondary.clone(),
            }),
            _ => Err(ConfigError::MissingIndexIds),
        }
    }
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub base_url: Option<String>,
    pub purpose: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub log_filter: String,
    pub request_timeout: Duration,
    pub api_base_url: String,
    pub twelvelabs: TwelveLabsConfig,
    pub storage: StorageConfig,
}

pub const DEFAULT_TWELVELABS_BASE_URL: &str = "https://api.twelvelabs.io/v1.3";
pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const DEFAULT_STORAGE_PURPOSE: &str = "vision";

/// Reads the first non-empty variable among `names`.
fn env_var<F>(lookup: &F, names: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    names
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        // Try to load config file
        let config_path = base_dir.join("config.toml");
        let config_file = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<ConfigFile>(&content)?
        } else {
            ConfigFile::default()
        };

        Ok(Self::resolve(config_file))
    }

    /// Layers environment variables over file values, then defaults.
    pub fn resolve(file: ConfigFile) -> Self {
        Self::resolve_with(file, |name| std::env::var(name).ok())
    }

    /// Same as [`Config::resolve`] with variables read through `lookup`.
    pub fn resolve_with<F>(file: ConfigFile, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = env_var(&lookup, &["PORT"])
            .and_then(|p| p.parse().ok())
            .or_else(|| file.server.as_ref().map(|s| s.port))
            .unwrap_or(defaults.port);

        let log_filter = env_var(&lookup, &["LOG_FILTER"])
            .or_else(|| file.server.as_ref().and_then(|s| non_empty(s.log_filter.as_ref())))
            .unwrap_or(defaults.log_filter);

        let request_timeout = env_var(&lookup, &["REQUEST_TIMEOUT_SECS"])
            .and_then(|v| v.parse().ok())
            .or(file.client.request_timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let api_base_url = env_var(&lookup, &["CLIP_API_BASE_URL"])
            .or_else(|| non_empty(file.client.api_base_url.as_ref()))
            .unwrap_or(defaults.api_base_url);

        let tl = &file.twelvelabs;
        let twelvelabs = TwelveLabsConfig {
            api_key: env_var(&lookup, &["TWELVELABS_API_KEY"]).or_else(|| non_empty(tl.api_key.as_ref())),
            base_url: env_var(&lookup, &["TWELVELABS_BASE_URL"])
                .or_else(|| non_empty(tl.base_url.as_ref()))
                .unwrap_or(defaults.twelvelabs.base_url),
            marengo_index_id: env_var(&lookup, &[
                "TWELVELABS_MARENGO_INDEX_ID",
                "NEXT_PUBLIC_TWELVELABS_MARENGO_INDEX_ID",
            ])
            .or_else(|| non_empty(tl.marengo_index_id.as_ref())),
            pegasus_index_id: env_var(&lookup, &[
                "TWELVELABS_PEGASUS_INDEX_ID",
                "NEXT_PUBLIC_TWELVELABS_PEGASUS_INDEX_ID",
            ])
            .or_else(|| non_empty(tl.pegasus_index_id.as_ref())),
            page_limit: tl
                .page_limit
                .filter(|&v| v > 0)
                .unwrap_or(defaults.twelvelabs.page_limit),
        };

        let storage = StorageConfig {
            base_url: env_var(&lookup, &["VSS_BASE_URL", "NEXT_PUBLIC_VSS_BASE_URL"])
                .or_else(|| non_empty(file.storage.base_url.as_ref())),
            purpose: non_empty(file.storage.purpose.as_ref()).unwrap_or(defaults.storage.purpose),
        };

        Self {
            port,
            log_filter,
            request_timeout,
            api_base_url,
            twelvelabs,
            storage,
        }
    }

    pub fn from_env() -> Self {
        Self::load().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Self::resolve(ConfigFile::default())
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            log_filter: "clip_catalog=debug,tower_http=debug".to_string(),
            request_timeout: Duration::from_secs(30),
            api_base_url: "http://localhost:3000".to_string(),
            twelvelabs: TwelveLabsConfig {
                api_key: None,
                base_url: DEFAULT_TWELVELABS_BASE_URL.to_string(),
                marengo_index_id: None,
                pegasus_index_id: None,
                page_limit: DEFAULT_PAGE_LIMIT,
            },
            storage: StorageConfig {
                base_url: None,
                purpose: DEFAULT_STORAGE_PURPOSE.to_string(),
            },
        }
    }
}
