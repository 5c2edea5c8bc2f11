//! Client configuration.

use std::time::Duration;
use thiserror::Error;

/// Default backend base URL, overridable via `ANIMA_BASE_URL`.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Errors raised while building a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base URL '{0}': must start with http:// or https://")]
    InvalidBaseUrl(String),
}

/// Configuration for [`AnimaClient`](crate::client::AnimaClient).
///
/// Use the builder pattern to customize:
///
/// ```
/// use anima::config::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_base_url("https://api.example.com")
///     .with_connect_timeout(std::time::Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend API
    pub base_url: String,
    /// Timeout for establishing the connection
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from the environment (`ANIMA_BASE_URL`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("ANIMA_BASE_URL") {
            config = config.with_base_url(url);
        }
        config.validate()?;
        Ok(config)
    }

    /// Set the backend base URL. A trailing slash is stripped so route
    /// formatting stays uniform.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let url = base_url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Check the config for obvious mistakes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_base_url_strips_trailing_slash() {
        let config = ClientConfig::new().with_base_url("https://api.example.com/");
        assert_eq!(config.base_url, "https://api.example.com");
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let config = ClientConfig::new().with_base_url("ftp://example.com");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
    }
}
