//! Load client config from environment variables or from a JSON file.

use crate::config::{validate, ClientConfig};
use crate::error::ConfigError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_BASE_URL: &str = "MOVIE_API_BASE_URL";
pub const ENV_DEFAULT_TENANT: &str = "MOVIE_DEFAULT_TENANT";
pub const ENV_MAX_RETRIES: &str = "MOVIE_MAX_RETRIES";
pub const ENV_SEARCH_DEBOUNCE_MS: &str = "MOVIE_SEARCH_DEBOUNCE_MS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "MOVIE_REQUEST_TIMEOUT_SECS";
pub const ENV_SESSION_FILE: &str = "MOVIE_SESSION_FILE";

impl ClientConfig {
    /// Defaults overridden by `MOVIE_*` environment variables, then validated.
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ClientConfig::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = var(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(tenant) = var(ENV_DEFAULT_TENANT) {
            config.default_tenant = tenant;
        }
        if let Some(raw) = var(ENV_MAX_RETRIES) {
            config.max_retries = parse_var(ENV_MAX_RETRIES, &raw)?;
        }
        if let Some(raw) = var(ENV_SEARCH_DEBOUNCE_MS) {
            config.search_debounce_ms = parse_var(ENV_SEARCH_DEBOUNCE_MS, &raw)?;
        }
        if let Some(raw) = var(ENV_REQUEST_TIMEOUT_SECS) {
            config.request_timeout_secs = parse_var(ENV_REQUEST_TIMEOUT_SECS, &raw)?;
        }
        if let Some(path) = var(ENV_SESSION_FILE) {
            config.session_file = Some(PathBuf::from(path));
        }

        validate(&config)?;
        Ok(config)
    }
}

impl ClientConfig {
    /// `MOVIE_*` variables from a dotenv-format file; process environment variables win.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file_vars = dotenvy::from_path_iter(path)
            .and_then(|iter| iter.collect::<Result<HashMap<String, String>, _>>())
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), vars = file_vars.len(), "read env file");
        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| file_vars.get(key).cloned()))
    }
}

fn parse_var<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

/// Load and validate a JSON config file. Missing fields take their defaults.
pub async fn load_from_file(path: impl AsRef<Path>) -> Result<ClientConfig, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let config: ClientConfig = serde_json::from_str(&raw)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    tracing::debug!(path = %path.display(), base_url = %config.base_url, "loaded client config");
    validate(&config)?;
    Ok(config)
}
