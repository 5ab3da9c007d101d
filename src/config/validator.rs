//! Config validation: URL shape, tenant id, and bounded timings.

use crate::config::ClientConfig;
use crate::error::ConfigError;
use crate::tenant::TenantId;
use reqwest::Url;

/// Allowed search debounce window in milliseconds.
pub const DEBOUNCE_RANGE_MS: std::ops::RangeInclusive<u64> = 300..=500;
pub const MAX_RETRIES_LIMIT: u32 = 5;

pub fn validate(config: &ClientConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url).map_err(|e| ConfigError::InvalidValue {
        key: "base_url",
        value: format!("{} ({})", config.base_url, e),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation(format!(
            "base_url must be http or https, got {}",
            url.scheme()
        )));
    }

    TenantId::parse(&config.default_tenant).map_err(|_| ConfigError::InvalidValue {
        key: "default_tenant",
        value: config.default_tenant.clone(),
    })?;

    if !DEBOUNCE_RANGE_MS.contains(&config.search_debounce_ms) {
        return Err(ConfigError::Validation(format!(
            "search_debounce_ms must be within {}..={}, got {}",
            DEBOUNCE_RANGE_MS.start(),
            DEBOUNCE_RANGE_MS.end(),
            config.search_debounce_ms
        )));
    }
    if config.max_retries > MAX_RETRIES_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_retries must be at most {}",
            MAX_RETRIES_LIMIT
        )));
    }
    if config.request_timeout_secs == 0 || config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation("timeouts must be non-zero".into()));
    }

    let s = &config.staleness;
    for (name, secs) in [
        ("movies_secs", s.movies_secs),
        ("movie_secs", s.movie_secs),
        ("tenants_secs", s.tenants_secs),
        ("categories_secs", s.categories_secs),
    ] {
        if secs == 0 {
            return Err(ConfigError::Validation(format!("staleness.{} must be non-zero", name)));
        }
    }

    Ok(())
}
