// Domain error types - uniform caller-facing messages, no key material or
// payload contents in any variant

use thiserror::Error;

/// Main error type for the envelope layer.
///
/// Callers never see these directly; the engine maps every terminal error
/// to a [`CallOutcome::Failure`](crate::envelope::outcome::CallOutcome)
/// through [`EnvelopeError::user_message`].
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// Ciphertext or MAC handling failed
    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),

    /// Response signature did not verify against the decrypted plaintext
    #[error("Response signature verification failed")]
    SignatureInvalid,

    /// Server rejected the session credential (HTTP 401)
    #[error("Session credential rejected")]
    AuthExpired,

    /// Server rejected the anti-forgery token (HTTP 403 or a csrf marker
    /// in the error body)
    #[error("Anti-forgery token rejected: {0}")]
    AntiForgeryRejected(String),

    /// Request was sent but no response arrived (connection-level failure)
    #[error("Network error: {0}")]
    Network(String),

    /// Request did not complete within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Server responded with an error status
    #[error("Server error: HTTP {status} - {body}")]
    Server { status: u16, body: String },

    /// Decrypted and verified response body was not valid structured data
    #[error("Failed to parse response payload: {0}")]
    Parse(String),

    /// Request could not be constructed or never left the process
    #[error("Client error: {0}")]
    Client(String),

    /// Persistent key-value store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Cryptographic operation errors
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Ciphertext was not valid base64
    #[error("Malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    /// Block padding was invalid after decryption (wrong key or corrupt data)
    #[error("Invalid padding in decrypted data")]
    InvalidPadding,

    /// Shared secret key has the wrong length
    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
}

/// Classify a transport failure. `reqwest` send errors never carry a
/// response body; a timeout is its own category because the retry policy
/// must not resend it, and builder errors mean the request never left the
/// process.
impl From<reqwest::Error> for EnvelopeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            EnvelopeError::Timeout(e.to_string())
        } else if e.is_builder() {
            EnvelopeError::Client(e.to_string())
        } else {
            EnvelopeError::Network(e.to_string())
        }
    }
}

impl EnvelopeError {
    /// True when the engine may resend the identical prepared request after
    /// a backoff delay. Only connection-level failures qualify; timeouts,
    /// crypto failures, and anything carrying a response are terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EnvelopeError::Network(_))
    }

    /// Uniform human-readable message surfaced to callers. Internal detail
    /// stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            EnvelopeError::Crypto(_) | EnvelopeError::SignatureInvalid => {
                "Response could not be verified. Please try again.".to_string()
            }
            EnvelopeError::AuthExpired => "Your session has expired. Please log in again.".to_string(),
            EnvelopeError::AntiForgeryRejected(_) => {
                "Request was rejected by the server. Please try again.".to_string()
            }
            EnvelopeError::Network(_) | EnvelopeError::Timeout(_) => {
                "Network error. Please check your internet connection.".to_string()
            }
            EnvelopeError::Server { status, .. } => format!("Server Error: {}", status),
            EnvelopeError::Parse(_) => "Received an unexpected response from the server.".to_string(),
            EnvelopeError::Client(_)
            | EnvelopeError::Storage(_)
            | EnvelopeError::Configuration(_) => "An unexpected error occurred.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_error_conversion() {
        let crypto_err = CryptoError::InvalidPadding;
        let err: EnvelopeError = crypto_err.into();
        match err {
            EnvelopeError::Crypto(CryptoError::InvalidPadding) => (),
            _ => panic!("Expected Crypto(InvalidPadding)"),
        }
    }

    #[test]
    fn test_only_network_errors_are_retryable() {
        assert!(EnvelopeError::Network("connection refused".to_string()).is_retryable());
        assert!(!EnvelopeError::Timeout("10s elapsed".to_string()).is_retryable());
        assert!(!EnvelopeError::AuthExpired.is_retryable());
        assert!(!EnvelopeError::SignatureInvalid.is_retryable());
        assert!(!EnvelopeError::Server { status: 500, body: "oops".to_string() }.is_retryable());
    }

    #[test]
    fn test_user_messages_no_sensitive_data() {
        let err = EnvelopeError::Storage("/home/user/.envelope/auth_token unreadable".to_string());
        assert!(!err.user_message().contains("auth_token"));

        let err = EnvelopeError::Network("tcp connect error 192.168.0.12:9999".to_string());
        assert!(!err.user_message().contains("192.168"));
    }

    #[test]
    fn test_server_error_message_carries_status() {
        let err = EnvelopeError::Server { status: 502, body: "bad gateway".to_string() };
        assert_eq!(err.user_message(), "Server Error: 502");
    }
}
