use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Workspace configuration, loaded once and handed down explicitly. There
/// is no process-wide configuration state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub picker: PickerConfig,
    pub storage: StorageConfig,
    pub scrape: ScrapeConfig,
}

impl Config {
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_toml(&raw)
    }
}

/// Settings for the ambiguity picker. Without an API key the pipeline
/// runs without one and ambiguous headlines stay unresolved.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-3.5-turbo-16k".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend label: "memory", or "sqlite" when that feature is built in.
    pub backend: String,
    /// Database file path for file-backed backends.
    pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Concurrent per-day discovery tasks. 1 means sequential.
    pub workers: usize,
    /// Overrides the built-in User-Agent on scraping requests.
    pub user_agent: Option<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            user_agent: None,
        }
    }
}
