//! Register store client configuration.
//!
//! One backend serves every register; each register lives under its own
//! path segment. Override the defaults via environment variables or build
//! the struct directly in tests.

use url::Url;

/// Upper bound on `REGISTER_MAX_RETRIES`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Configuration for connecting to the register store.
#[derive(Debug, Clone)]
pub struct RegisterApiConfig {
    /// Base URL of the register store.
    /// Default: <http://localhost:5002>
    pub base_url: Url,
    /// Request timeout in seconds. A timeout counts as a connection failure.
    pub timeout_secs: u64,
    /// Extra attempts for idempotent reads after a transport failure.
    pub max_retries: u32,
}

impl RegisterApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `LLC_REGISTER_URL` (default: `http://localhost:5002`)
    /// - `REGISTER_TIMEOUT_SECS` (default: 30)
    /// - `REGISTER_MAX_RETRIES` (default: 0, clamped to [`MAX_RETRIES_LIMIT`])
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env_url("LLC_REGISTER_URL", "http://localhost:5002")?,
            timeout_secs: env_number("REGISTER_TIMEOUT_SECS", 30),
            max_retries: clamp_retries(env_number("REGISTER_MAX_RETRIES", 0)),
        })
    }

    /// Configuration pointing at a local mock server.
    pub fn local(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base("base_url", base_url)?,
            timeout_secs: 5,
            max_retries: 0,
        })
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    parse_base(var, &raw)
}

fn parse_base(var: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(
            var.to_string(),
            "URL cannot be used as a base".to_string(),
        ));
    }
    Ok(url)
}

fn clamp_retries(requested: u32) -> u32 {
    if requested > MAX_RETRIES_LIMIT {
        tracing::warn!(
            requested,
            limit = MAX_RETRIES_LIMIT,
            "REGISTER_MAX_RETRIES above limit, clamping"
        );
    }
    requested.min(MAX_RETRIES_LIMIT)
}

fn env_number<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_builds_valid_config() {
        let cfg = RegisterApiConfig::local("http://127.0.0.1:9000").unwrap();
        assert_eq!(cfg.base_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.max_retries, 0);
    }

    #[test]
    fn env_url_uses_default_when_var_absent() {
        let url = env_url("NONEXISTENT_VAR_LLC_12345", "http://localhost:5002").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5002/");
    }

    #[test]
    fn env_url_rejects_invalid_url() {
        std::env::set_var("TEST_BAD_URL_LLC", "not a url");
        let result = env_url("TEST_BAD_URL_LLC", "http://localhost:5002");
        std::env::remove_var("TEST_BAD_URL_LLC");
        assert!(result.is_err());
    }

    #[test]
    fn non_base_url_is_rejected() {
        assert!(parse_base("x", "mailto:someone@example.com").is_err());
    }

    #[test]
    fn retries_are_clamped() {
        assert_eq!(clamp_retries(3), 3);
        assert_eq!(clamp_retries(57), MAX_RETRIES_LIMIT);
        assert_eq!(clamp_retries(u32::MAX), MAX_RETRIES_LIMIT);
    }

    #[test]
    fn env_number_falls_back_on_garbage() {
        std::env::set_var("TEST_BAD_NUMBER_LLC", "many");
        let n: u64 = env_number("TEST_BAD_NUMBER_LLC", 30);
        std::env::remove_var("TEST_BAD_NUMBER_LLC");
        assert_eq!(n, 30);
    }
}
