// Envelope protocol engine: encode -> send -> decode with the
// retry/refresh state machine

use crate::config::Config;
use crate::core::constants::{headers as header_names, wire};
use crate::core::crypto::{CipherCodec, EnvelopeSigner};
use crate::core::errors::EnvelopeError;
use crate::envelope::hooks::{PostReceiveHook, PreSendHook, RequestContext, ResponseContext};
use crate::envelope::outcome::CallOutcome;
use crate::envelope::retry::RetryState;
use crate::state::csrf::AntiForgeryTokenManager;
use crate::state::kv::KeyValueStore;
use crate::state::session::SessionTokenStore;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Cap on how much of an error body is kept in error detail (logs only;
/// callers never see it).
const ERROR_BODY_LIMIT: usize = 512;

/// Ciphertext-only request body: the signature and anti-forgery token
/// travel in headers, never in the body.
#[derive(Debug, Serialize)]
struct EnvelopeRequestBody {
    enc_data: String,
}

/// Response wire shape: ciphertext plus the MAC of the plaintext it
/// encodes. Meaningless unless both fields are present together.
#[derive(Debug, Deserialize)]
pub struct EncryptedEnvelope {
    pub enc_data: String,
    pub signature: String,
}

/// The secure transport client.
///
/// One instance per process is the expected usage; wrap it in `Arc` to
/// share across tasks. Every backend call goes through [`call`], which
/// always resolves to a [`CallOutcome`] - no transport or crypto error
/// ever escapes raw.
///
/// [`call`]: EnvelopeClient::call
pub struct EnvelopeClient {
    http: reqwest::Client,
    config: Config,
    codec: CipherCodec,
    signer: EnvelopeSigner,
    session: SessionTokenStore,
    csrf: AntiForgeryTokenManager,
    pre_send_hooks: Vec<PreSendHook>,
    post_receive_hooks: Vec<PostReceiveHook>,
}

impl EnvelopeClient {
    /// Build a client from validated configuration and a credential store.
    /// Loads any persisted session token before returning.
    pub async fn new(
        config: Config,
        storage: Arc<dyn KeyValueStore>,
    ) -> Result<Self, EnvelopeError> {
        let config = config.validated()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| {
                EnvelopeError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        let codec = CipherCodec::new(config.secret_key.as_bytes())?;
        let signer = EnvelopeSigner::new(config.secret_key.as_bytes())?;
        let csrf =
            AntiForgeryTokenManager::new(http.clone(), config.endpoint_url(wire::CSRF_PATH));
        let session = SessionTokenStore::new(storage);
        session.load().await;

        Ok(Self {
            http,
            config,
            codec,
            signer,
            session,
            csrf,
            pre_send_hooks: Vec::new(),
            post_receive_hooks: Vec::new(),
        })
    }

    /// Register a hook run before every send (including resends).
    pub fn with_pre_send_hook(mut self, hook: PreSendHook) -> Self {
        self.pre_send_hooks.push(hook);
        self
    }

    /// Register a hook run on every received response.
    pub fn with_post_receive_hook(mut self, hook: PostReceiveHook) -> Self {
        self.post_receive_hooks.push(hook);
        self
    }

    /// Store a session bearer credential after a successful login.
    pub async fn set_session_token(&self, token: &str) -> Result<(), EnvelopeError> {
        self.session.set(token).await
    }

    /// Drop the session credential (logout).
    pub async fn clear_session_token(&self) -> Result<(), EnvelopeError> {
        self.session.clear().await
    }

    /// Current in-memory session credential, if any.
    pub fn session_token(&self) -> Option<String> {
        self.session.get()
    }

    /// Currently cached anti-forgery token, without fetching.
    pub async fn anti_forgery_token(&self) -> Option<String> {
        self.csrf.peek().await
    }

    /// Seed the anti-forgery cache with a token obtained out of band,
    /// skipping the lazy fetch on the next call.
    pub async fn prime_anti_forgery_token(&self, token: &str) {
        self.csrf.prime(token.to_string()).await;
    }

    /// Execute one logical call: encrypt and sign `payload`, POST it to
    /// `path`, verify and decrypt the response, and parse it as `T`.
    ///
    /// Recovery is handled here: a rejected anti-forgery token triggers one
    /// forced refresh and one re-execution; connection failures are resent
    /// with linear backoff up to the configured budget; an expired session
    /// clears the stored credential. Whatever happens, the caller gets a
    /// [`CallOutcome`].
    pub async fn call<P, T>(&self, path: &str, payload: &P) -> CallOutcome<T>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        match self.call_inner(path, payload).await {
            Ok(data) => CallOutcome::success(data),
            Err(e) => {
                error!(path, error = %e, "Envelope call failed");
                CallOutcome::failure(e.user_message())
            }
        }
    }

    async fn call_inner<P, T>(&self, path: &str, payload: &P) -> Result<T, EnvelopeError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let plaintext = serde_json::to_vec(payload)
            .map_err(|e| EnvelopeError::Client(format!("Failed to serialize request: {}", e)))?;

        match self.execute(path, &plaintext).await {
            Err(EnvelopeError::AntiForgeryRejected(reason)) => {
                // One-shot recovery: refresh the token and re-run the whole
                // prepare/send/decode sequence. A second rejection is final.
                warn!(path, reason = %reason, "Anti-forgery token rejected; refreshing once");
                self.csrf.get(true).await?;
                self.execute(path, &plaintext).await
            }
            other => other,
        }
    }

    /// One full Prepare -> Send -> Validate -> Decode pass.
    async fn execute<T: DeserializeOwned>(
        &self,
        path: &str,
        plaintext: &[u8],
    ) -> Result<T, EnvelopeError> {
        // Prepare: csrf token (cached), ciphertext body, plaintext MAC
        let csrf_token = self.csrf.get(false).await?;
        let body = EnvelopeRequestBody { enc_data: self.codec.encode(plaintext) };
        let signature = self.signer.sign(plaintext);
        let headers = self.build_headers(&csrf_token, &signature)?;

        let response = self.send_with_retry(path, &body, headers).await?;
        let status = response.status();

        for hook in &self.post_receive_hooks {
            hook(&ResponseContext { path: path.to_string(), status: status.as_u16() });
        }

        // Failure classification, ordered; first match wins
        if status == StatusCode::UNAUTHORIZED {
            if let Err(e) = self.session.clear().await {
                warn!(error = %e, "Failed to erase stored session token");
            }
            return Err(EnvelopeError::AuthExpired);
        }
        if !status.is_success() {
            let mut body_text = response.text().await.unwrap_or_default();
            if status == StatusCode::FORBIDDEN
                || body_text.to_lowercase().contains(wire::CSRF_REJECT_MARKER)
            {
                return Err(EnvelopeError::AntiForgeryRejected(format!("HTTP {}", status)));
            }
            let mut cut = ERROR_BODY_LIMIT.min(body_text.len());
            while !body_text.is_char_boundary(cut) {
                cut -= 1;
            }
            body_text.truncate(cut);
            return Err(EnvelopeError::Server { status: status.as_u16(), body: body_text });
        }

        // Receive & validate: decrypt, then verify before trusting anything
        let envelope: EncryptedEnvelope = response
            .json()
            .await
            .map_err(|e| EnvelopeError::Parse(format!("response envelope: {}", e)))?;
        let decrypted = self.codec.decode(&envelope.enc_data)?;
        if !self.signer.verify(&decrypted, &envelope.signature) {
            return Err(EnvelopeError::SignatureInvalid);
        }

        // Decode into the caller's type only after verification
        serde_json::from_slice(&decrypted).map_err(|e| EnvelopeError::Parse(e.to_string()))
    }

    fn build_headers(
        &self,
        csrf_token: &str,
        signature: &str,
    ) -> Result<HeaderMap, EnvelopeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header_names::CSRF_TOKEN,
            HeaderValue::from_str(csrf_token)
                .map_err(|e| EnvelopeError::Client(format!("invalid csrf token: {}", e)))?,
        );
        headers.insert(
            header_names::SIGNATURE,
            HeaderValue::from_str(signature)
                .map_err(|e| EnvelopeError::Client(format!("invalid signature header: {}", e)))?,
        );
        headers.insert(
            header_names::DEVICE_PLATFORM,
            HeaderValue::from_static(header_names::DEVICE_PLATFORM_VALUE),
        );
        if let Some(token) = self.session.get() {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| EnvelopeError::Client(format!("invalid session token: {}", e)))?,
            );
        }
        Ok(headers)
    }

    /// Dispatch the prepared request, resending the identical request on
    /// connection-level failure with a delay of `base * attempt`. Timeouts
    /// and anything carrying a response are never resent here.
    async fn send_with_retry(
        &self,
        path: &str,
        body: &EnvelopeRequestBody,
        headers: HeaderMap,
    ) -> Result<reqwest::Response, EnvelopeError> {
        let url = self.config.endpoint_url(path);
        let mut retry = RetryState::new(
            self.config.retry_attempts,
            Duration::from_millis(self.config.retry_delay_ms),
        );

        loop {
            let mut ctx = RequestContext {
                path: path.to_string(),
                attempt: retry.attempts(),
                headers: headers.clone(),
            };
            for hook in &self.pre_send_hooks {
                hook(&mut ctx);
            }

            debug!(path, attempt = ctx.attempt, "Dispatching envelope request");
            match self.http.post(&url).headers(ctx.headers).json(body).send().await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    let err = EnvelopeError::from(e);
                    match (err.is_retryable(), retry.next_delay()) {
                        (true, Some(delay)) => {
                            warn!(path, delay_ms = delay.as_millis() as u64, error = %err,
                                "Connection failed; waiting before resend");
                            tokio::time::sleep(delay).await;
                        }
                        _ => return Err(err),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::kv::MemoryKeyValueStore;

    fn test_config(base_url: &str) -> Config {
        Config {
            base_url: base_url.to_string(),
            secret_key: "T4LXYFqvDkzN7BpMjh3oWsR1V2gJ9uZk".to_string(),
            timeout_secs: 5,
            connect_timeout_secs: 1,
            retry_attempts: 2,
            retry_delay_ms: 10,
            storage_dir: None,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }

    #[tokio::test]
    async fn test_client_construction() {
        let client = EnvelopeClient::new(
            test_config("http://localhost:9999/api"),
            Arc::new(MemoryKeyValueStore::new()),
        )
        .await
        .unwrap();
        assert_eq!(client.session_token(), None);
        assert_eq!(client.anti_forgery_token().await, None);
    }

    #[tokio::test]
    async fn test_construction_rejects_bad_key() {
        let mut config = test_config("http://localhost:9999/api");
        config.secret_key = "short".to_string();
        let result =
            EnvelopeClient::new(config, Arc::new(MemoryKeyValueStore::new())).await;
        assert!(matches!(result, Err(EnvelopeError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_loads_persisted_session_token_at_startup() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        kv.write("auth_token", "from-disk").await.unwrap();
        let client =
            EnvelopeClient::new(test_config("http://localhost:9999/api"), kv).await.unwrap();
        assert_eq!(client.session_token(), Some("from-disk".to_string()));
    }
}
