//! Configuration loading and merging logic.

use std::path::PathBuf;

use crate::rate_limit::get_delay_from_env;

use super::{Config, ConfigError, Settings};

/// Environment variable overriding `base_url`.
pub const BASE_URL_ENV: &str = "WATCHWARM_BASE_URL";
/// Environment variable overriding `item_delay_ms`.
pub const ITEM_DELAY_ENV: &str = "WATCHWARM_ITEM_DELAY_MS";

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
}

/// Load config from the explicit path, or discover one with prefer.
///
/// An explicit path that cannot be read is an error; a missing discovered
/// config is not.
async fn load_file_config(options: &LoadOptions) -> Result<Config, ConfigError> {
    match options.config_path {
        Some(ref path) => Config::load_from_path(path).await,
        None => Config::load().await,
    }
}

/// Environment wins over file config.
fn apply_env_overrides(settings: &mut Settings) {
    if let Some(base_url) = std::env::var(BASE_URL_ENV).ok().filter(|s| !s.is_empty()) {
        settings.base_url = base_url;
    }
    settings.item_delay_ms =
        get_delay_from_env(ITEM_DELAY_ENV, settings.item_delay_ms).as_millis() as u64;
}

/// Resolve settings: defaults, then config file, then environment.
pub async fn load_settings_with_options(options: LoadOptions) -> Result<Settings, ConfigError> {
    let config = load_file_config(&options).await?;
    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from: {}", path.display());
    }

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings)?;
    apply_env_overrides(&mut settings);

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn explicit_path_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "max_failures = 7\nrelated_limit = 2\n").unwrap();

        let settings = load_settings_with_options(LoadOptions {
            config_path: Some(path),
        })
        .await
        .unwrap();

        assert_eq!(settings.max_failures, 7);
        assert_eq!(settings.related_limit, 2);
    }

    #[tokio::test]
    async fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_settings_with_options(LoadOptions {
            config_path: Some(dir.path().join("nope.yaml")),
        })
        .await;
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
