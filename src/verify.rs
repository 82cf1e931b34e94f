//! Human-verification gate.
//!
//! The routing collaborator composes a [`VerificationGate`] around
//! sensitive handlers; this crate supplies the gate itself. The HTTP
//! implementation checks submitted tokens against a challenge provider's
//! verify endpoint and remembers passing tokens for a short TTL, so a
//! client re-submitting the same token doesn't hit the provider again.
//! An unconfigured deployment uses [`GateDisabled`], which passes
//! everything.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::cache::TtlCache;

/// Passing tokens remembered at most this many at a time.
const TOKEN_CACHE_ENTRIES: usize = 512;

/// Gate failures - only genuinely exceptional conditions use this channel;
/// a failed check is the `Ok(false)` outcome, not an error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VerifyError {
    #[error("verification service unreachable: {0}")]
    Unreachable(String),
}

/// Pass/fail check on a submitted verification token.
#[async_trait]
pub trait VerificationGate: Send + Sync {
    /// Whether the token passes. `remote_ip` is forwarded to the provider
    /// when known.
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<bool, VerifyError>;
}

/// Gate used when verification is not configured: everything passes.
pub struct GateDisabled;

#[async_trait]
impl VerificationGate for GateDisabled {
    async fn verify(&self, _token: &str, _remote_ip: Option<&str>) -> Result<bool, VerifyError> {
        Ok(true)
    }
}

/// Connection settings for the HTTP gate.
#[derive(Debug, Clone)]
pub struct GateOptions {
    /// Provider verify endpoint
    pub verify_url: String,
    /// Server-side secret key
    pub secret: String,
    /// Request timeout
    pub timeout: Duration,
    /// How long passing tokens are remembered
    pub cache_ttl: Duration,
}

/// Verify response from the challenge provider.
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// HTTP implementation against a challenge provider's verify endpoint.
pub struct HttpGate {
    client: reqwest::Client,
    verify_url: String,
    secret: String,
    passed: Mutex<TtlCache<String, ()>>,
}

impl HttpGate {
    pub fn new(options: GateOptions) -> Self {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            verify_url: options.verify_url,
            secret: options.secret,
            passed: Mutex::new(TtlCache::new(options.cache_ttl, TOKEN_CACHE_ENTRIES)),
        }
    }
}

#[async_trait]
impl VerificationGate for HttpGate {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<bool, VerifyError> {
        if token.is_empty() {
            return Ok(false);
        }
        if self.passed.lock().get(&token.to_string()).is_some() {
            return Ok(true);
        }

        let mut form = vec![
            ("secret", self.secret.as_str()),
            ("response", token),
        ];
        if let Some(remote_ip) = remote_ip {
            form.push(("remoteip", remote_ip));
        }

        let response = self
            .client
            .post(&self.verify_url)
            .form(&form)
            .send()
            .await
            .map_err(|error| VerifyError::Unreachable(error.to_string()))?;
        let outcome: VerifyResponse = response
            .error_for_status()
            .map_err(|error| VerifyError::Unreachable(error.to_string()))?
            .json()
            .await
            .map_err(|error| VerifyError::Unreachable(error.to_string()))?;

        if outcome.success {
            self.passed.lock().insert(token.to_string(), ());
        } else {
            tracing::info!(errors = ?outcome.error_codes, "verification token rejected");
        }
        Ok(outcome.success)
    }
}
