//! Configuration management for watchwarm using the prefer crate.

mod loader;
mod settings;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use loader::{load_settings_with_options, LoadOptions};
pub use settings::Settings;

/// Errors loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {format} config {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
    #[error("Invalid setting {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Configuration file structure. Every field is optional; unset fields keep
/// the [`Settings`] default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Base URL of the application whose routes get warmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    /// Retries after the first attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    /// Delay between prefetch queue items in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_delay_ms: Option<u64>,
    /// Failures before a key is ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_failures: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefetch_related: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover_delay_ms: Option<u64>,
    /// Cache clear interval in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_interval_secs: Option<u64>,
    /// Listen address for the control API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Returns the default (empty) config when nothing is found.
    pub async fn load() -> Result<Self, ConfigError> {
        match prefer::load("watchwarm").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await,
                None => Ok(Self::default()),
            },
            // No config file found
            Err(_) => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_error = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| parse_error("TOML", e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_error("YAML", e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| parse_error("JSON", e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) -> Result<(), ConfigError> {
        if let Some(ref base_url) = self.base_url {
            url::Url::parse(base_url).map_err(|e| ConfigError::Invalid {
                key: "base_url",
                message: e.to_string(),
            })?;
            settings.base_url = base_url.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout_secs {
            if timeout == 0 {
                return Err(ConfigError::Invalid {
                    key: "request_timeout_secs",
                    message: "must be at least 1".to_string(),
                });
            }
            settings.request_timeout_secs = timeout;
        }
        if let Some(retries) = self.max_retries {
            settings.max_retries = retries;
        }
        if let Some(delay) = self.item_delay_ms {
            settings.item_delay_ms = delay;
        }
        if let Some(max) = self.max_failures {
            settings.max_failures = max;
        }
        if let Some(related) = self.prefetch_related {
            settings.prefetch_related = related;
        }
        if let Some(delay) = self.related_delay_ms {
            settings.related_delay_ms = delay;
        }
        if let Some(limit) = self.related_limit {
            settings.related_limit = limit;
        }
        if let Some(delay) = self.hover_delay_ms {
            settings.hover_delay_ms = delay;
        }
        if let Some(interval) = self.clear_interval_secs {
            if interval == 0 {
                return Err(ConfigError::Invalid {
                    key: "clear_interval_secs",
                    message: "must be at least 1".to_string(),
                });
            }
            settings.clear_interval_secs = interval;
        }
        if let Some(ref listen) = self.listen {
            settings.listen = listen.clone();
        }
        Ok(())
    }
}
