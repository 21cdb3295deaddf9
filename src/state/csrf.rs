// Anti-forgery (CSRF) token cache with a forced-refresh path

use crate::core::errors::EnvelopeError;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CsrfResponse {
    token: String,
}

/// Fetches and caches the server-issued anti-forgery token.
///
/// The token lives in memory only and is replaced whole - never partially
/// updated. Concurrent calls may race to refresh it; the latest fetched
/// value simply overwrites the cache, which is safe because any
/// freshly-issued token is valid. Fetch failures propagate to the engine,
/// which owns all retry decisions.
pub struct AntiForgeryTokenManager {
    http: reqwest::Client,
    csrf_url: String,
    cached: RwLock<Option<String>>,
}

impl AntiForgeryTokenManager {
    pub fn new(http: reqwest::Client, csrf_url: String) -> Self {
        Self { http, csrf_url, cached: RwLock::new(None) }
    }

    /// Return the cached token, fetching a fresh one when the cache is
    /// empty or `force_refresh` is set.
    pub async fn get(&self, force_refresh: bool) -> Result<String, EnvelopeError> {
        if !force_refresh {
            if let Some(token) = self.cached.read().await.clone() {
                return Ok(token);
            }
        }

        debug!(force_refresh, "Fetching anti-forgery token");
        let response = self.http.get(&self.csrf_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnvelopeError::Server { status: status.as_u16(), body });
        }

        let payload: CsrfResponse = response
            .json()
            .await
            .map_err(|e| EnvelopeError::Parse(format!("csrf response: {}", e)))?;

        *self.cached.write().await = Some(payload.token.clone());
        Ok(payload.token)
    }

    /// Seed the cache with a token delivered out of band (some endpoints
    /// hand one back alongside their payload). Replaces any cached value.
    pub async fn prime(&self, token: String) {
        *self.cached.write().await = Some(token);
    }

    /// Current cached value without triggering a fetch.
    pub async fn peek(&self) -> Option<String> {
        self.cached.read().await.clone()
    }
}
