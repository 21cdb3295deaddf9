//! Envelope client constants - single source of truth for all wire-level
//! and configuration values.
//!
//! The header names, body field names, and endpoint paths here are fixed by
//! the server contract and must not change without a coordinated server
//! deployment.

/// Transport header names
pub mod headers {
    /// Anti-forgery token header
    pub const CSRF_TOKEN: &str = "X-CSRFToken";
    /// HMAC signature of the plaintext request payload
    pub const SIGNATURE: &str = "X-Signature";
    /// Platform marker attached to every request
    pub const DEVICE_PLATFORM: &str = "X-Device-Platform";
    /// Value sent in the platform marker header
    pub const DEVICE_PLATFORM_VALUE: &str = "mobile";
}

/// Wire endpoint paths and markers
pub mod wire {
    /// Endpoint that issues fresh anti-forgery tokens
    pub const CSRF_PATH: &str = "get_csrf/";
    /// Case-insensitive marker in error bodies that signals a stale
    /// anti-forgery token
    pub const CSRF_REJECT_MARKER: &str = "csrf";
}

/// Cryptographic constants
pub mod crypto {
    /// AES-256 / HMAC-SHA256 shared secret key length in bytes
    pub const SECRET_KEY_LENGTH: usize = 32;
}

/// Retry and timeout defaults (match the deployed server contract)
pub mod defaults {
    /// Total request timeout in seconds
    pub const TIMEOUT_SECS: u64 = 10;
    /// Connection establishment timeout in seconds
    pub const CONNECT_TIMEOUT_SECS: u64 = 2;
    /// Maximum number of retries after the initial send
    pub const RETRY_ATTEMPTS: u32 = 3;
    /// Base backoff delay in milliseconds; scaled by attempt number
    pub const RETRY_DELAY_MS: u64 = 1000;
}

/// Persistent storage keys
pub mod storage {
    /// Key under which the session bearer credential is persisted
    pub const SESSION_TOKEN_KEY: &str = "auth_token";
}

/// Configuration environment variables
pub mod config {
    pub const ENV_BASE_URL: &str = "ENVELOPE_BASE_URL";
    pub const ENV_SECRET_KEY: &str = "ENVELOPE_SECRET_KEY";
    pub const ENV_TIMEOUT_SECS: &str = "ENVELOPE_TIMEOUT_SECS";
    pub const ENV_RETRY_ATTEMPTS: &str = "ENVELOPE_RETRY_ATTEMPTS";
    pub const ENV_RETRY_DELAY_MS: &str = "ENVELOPE_RETRY_DELAY_MS";
    pub const ENV_STORAGE_DIR: &str = "ENVELOPE_STORAGE_DIR";
    pub const ENV_LOG_LEVEL: &str = "ENVELOPE_LOG_LEVEL";
    pub const ENV_LOG_FORMAT: &str = "ENVELOPE_LOG_FORMAT";
}
