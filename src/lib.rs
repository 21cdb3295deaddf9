// Library root for the envelope client

//! envelope-client: a secure transport envelope for backend calls.
//!
//! Every request payload is AES-encrypted and HMAC-signed before it leaves
//! the process, carries a rotating anti-forgery token, and every response is
//! signature-verified before its decrypted contents are trusted. The engine
//! recovers transparently from transient network failures, stale
//! anti-forgery tokens, and expired session credentials, and always returns
//! a uniform [`CallOutcome`] to callers.

pub mod config;
pub mod core;
pub mod envelope;
pub mod state;

pub use config::Config;
pub use core::errors::EnvelopeError;
pub use envelope::engine::{EncryptedEnvelope, EnvelopeClient};
pub use envelope::hooks::{PostReceiveHook, PreSendHook, RequestContext, ResponseContext};
pub use envelope::outcome::CallOutcome;
pub use state::kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
