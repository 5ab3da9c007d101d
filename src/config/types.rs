//! Client configuration types. Every field has a default so partial JSON files and env overrides work.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Freshness windows for cached query results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StalenessConfig {
    pub movies_secs: u64,
    pub movie_secs: u64,
    pub tenants_secs: u64,
    pub categories_secs: u64,
}

impl Default for StalenessConfig {
    fn default() -> Self {
        StalenessConfig {
            movies_secs: 5 * 60,
            movie_secs: 10 * 60,
            tenants_secs: 30 * 60,
            categories_secs: 30 * 60,
        }
    }
}

impl StalenessConfig {
    pub fn movies(&self) -> Duration {
        Duration::from_secs(self.movies_secs)
    }

    pub fn movie(&self) -> Duration {
        Duration::from_secs(self.movie_secs)
    }

    pub fn tenants(&self) -> Duration {
        Duration::from_secs(self.tenants_secs)
    }

    pub fn categories(&self) -> Duration {
        Duration::from_secs(self.categories_secs)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Tenant used before resolution and as the redirect target for unknown slugs.
    pub default_tenant: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Automatic retries after the first attempt, for transient failures only.
    pub max_retries: u32,
    /// First retry delay; doubles on each further attempt.
    pub retry_backoff_ms: u64,
    /// Quiescence window for search input (300–500 ms).
    pub search_debounce_ms: u64,
    pub staleness: StalenessConfig,
    /// JSON file backing the session store. None keeps session state in memory.
    pub session_file: Option<PathBuf>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_tenant: crate::tenant::DEFAULT_TENANT.to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            max_retries: 2,
            retry_backoff_ms: 200,
            search_debounce_ms: 300,
            staleness: StalenessConfig::default(),
            session_file: None,
            user_agent: format!("movie-catalog-sdk/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}
