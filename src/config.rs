// Configuration management

use crate::core::constants::{config as env_keys, crypto, defaults};
use crate::core::errors::EnvelopeError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Client configuration, injected at construction.
///
/// There is deliberately no hidden process-wide state: callers build one
/// `Config`, construct one [`EnvelopeClient`](crate::EnvelopeClient) from
/// it, and share that instance (behind `Arc`) if singleton behavior is
/// wanted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL; normalized to end with a trailing slash
    pub base_url: String,
    /// 32-byte pre-shared secret for AES-256 and HMAC-SHA256
    #[serde(skip_serializing)]
    pub secret_key: String,
    /// Total request timeout in seconds
    pub timeout_secs: u64,
    /// Connection establishment timeout in seconds
    pub connect_timeout_secs: u64,
    /// Maximum retries after the initial send on connection failure
    pub retry_attempts: u32,
    /// Base backoff delay in milliseconds; scaled by attempt number
    pub retry_delay_ms: u64,
    /// Directory for the file-backed credential store, when used
    pub storage_dir: Option<PathBuf>,
    /// Logging configuration
    pub log_level: String,
    pub log_format: String, // "json" or "text"
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for everything except the base URL and the secret key.
    pub fn from_env() -> Result<Self, EnvelopeError> {
        let config = Self {
            base_url: Self::require_env(env_keys::ENV_BASE_URL)?,
            secret_key: Self::require_env(env_keys::ENV_SECRET_KEY)?,
            timeout_secs: Self::parse_u64_or_default(
                env_keys::ENV_TIMEOUT_SECS,
                defaults::TIMEOUT_SECS,
            )?,
            connect_timeout_secs: defaults::CONNECT_TIMEOUT_SECS,
            retry_attempts: Self::parse_u32_or_default(
                env_keys::ENV_RETRY_ATTEMPTS,
                defaults::RETRY_ATTEMPTS,
            )?,
            retry_delay_ms: Self::parse_u64_or_default(
                env_keys::ENV_RETRY_DELAY_MS,
                defaults::RETRY_DELAY_MS,
            )?,
            storage_dir: env::var(env_keys::ENV_STORAGE_DIR).ok().map(PathBuf::from),
            log_level: env::var(env_keys::ENV_LOG_LEVEL).unwrap_or_else(|_| "info".to_string()),
            log_format: env::var(env_keys::ENV_LOG_FORMAT).unwrap_or_else(|_| "text".to_string()),
        };
        config.validated()
    }

    /// Validate field constraints and normalize the base URL.
    pub fn validated(mut self) -> Result<Self, EnvelopeError> {
        if self.secret_key.len() != crypto::SECRET_KEY_LENGTH {
            return Err(EnvelopeError::Configuration(format!(
                "secret key must be exactly {} bytes, got {}",
                crypto::SECRET_KEY_LENGTH,
                self.secret_key.len()
            )));
        }
        if self.base_url.is_empty() {
            return Err(EnvelopeError::Configuration("base URL must not be empty".to_string()));
        }
        if !self.base_url.ends_with('/') {
            self.base_url.push('/');
        }
        Ok(self)
    }

    /// Resolve an endpoint path against the base URL.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    fn require_env(key: &str) -> Result<String, EnvelopeError> {
        env::var(key)
            .map_err(|_| EnvelopeError::Configuration(format!("{} must be set", key)))
    }

    fn parse_u64_or_default(key: &str, default: u64) -> Result<u64, EnvelopeError> {
        match env::var(key) {
            Ok(v) => v.parse().map_err(|_| {
                EnvelopeError::Configuration(format!("{} must be a positive integer", key))
            }),
            Err(_) => Ok(default),
        }
    }

    fn parse_u32_or_default(key: &str, default: u32) -> Result<u32, EnvelopeError> {
        match env::var(key) {
            Ok(v) => v.parse().map_err(|_| {
                EnvelopeError::Configuration(format!("{} must be a positive integer", key))
            }),
            Err(_) => Ok(default),
        }
    }
}

/// Initialize tracing from the config. Call once at process start; callers
/// embedding this crate in a larger app will usually install their own
/// subscriber instead.
pub fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if config.log_format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            base_url: "https://api.example.com/api".to_string(),
            secret_key: "T4LXYFqvDkzN7BpMjh3oWsR1V2gJ9uZk".to_string(),
            timeout_secs: 10,
            connect_timeout_secs: 2,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            storage_dir: None,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }

    #[test]
    fn test_base_url_gains_trailing_slash() {
        let config = base_config().validated().unwrap();
        assert_eq!(config.base_url, "https://api.example.com/api/");
    }

    #[test]
    fn test_endpoint_url_joins_cleanly() {
        let config = base_config().validated().unwrap();
        assert_eq!(
            config.endpoint_url("get_products/"),
            "https://api.example.com/api/get_products/"
        );
        assert_eq!(
            config.endpoint_url("/get_products/"),
            "https://api.example.com/api/get_products/"
        );
    }

    #[test]
    fn test_rejects_wrong_key_length() {
        let mut config = base_config();
        config.secret_key = "too-short".to_string();
        assert!(matches!(
            config.validated(),
            Err(EnvelopeError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_empty_base_url() {
        let mut config = base_config();
        config.base_url = String::new();
        assert!(matches!(
            config.validated(),
            Err(EnvelopeError::Configuration(_))
        ));
    }
}
