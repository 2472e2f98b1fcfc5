//! Remote credential verification
//!
//! On a cache miss the gateway asks an external identity service whether the
//! presented credentials are valid. The HTTP implementation POSTs a JSON body
//! and expects the three identifiers of the verified API token back.

use crate::config::VerifierConfig;
use crate::error::VerifyError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Identity returned by a successful verification
///
/// All three identifiers are required; a response missing any of them is
/// rejected rather than partially accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub team_id: u64,
    pub mqtt_client_id: u64,
    pub api_token_id: u64,
}

/// Out-of-process identity check
#[async_trait]
pub trait RemoteVerifier: Send + Sync {
    /// Verify one set of credentials. No retries.
    async fn verify(
        &self,
        client_id: &str,
        username: &str,
        password: &str,
    ) -> std::result::Result<VerifiedIdentity, VerifyError>;

    /// Verifier name for logging
    fn name(&self) -> &str;
}

/// Request body understood by the verification endpoint
#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    client_id: &'a str,
    api_key: &'a str,
    api_secret: &'a str,
}

/// Verifier backed by an HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpVerifier {
    client: reqwest::Client,
    url: String,
}

impl HttpVerifier {
    /// Build a verifier from configuration
    pub fn new(config: &VerifierConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("Invalid header name: {}", name))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("Invalid value for header {}", name))?;
            headers.insert(name, value);
        }
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers)
            .user_agent(concat!("mqtt-auth-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build verification HTTP client")?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RemoteVerifier for HttpVerifier {
    async fn verify(
        &self,
        client_id: &str,
        username: &str,
        password: &str,
    ) -> std::result::Result<VerifiedIdentity, VerifyError> {
        let body = VerifyRequest {
            client_id,
            api_key: username,
            api_secret: password,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(VerifyError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::Status {
                status: status.as_u16(),
            });
        }

        // Decode failures surface as Malformed, not Transport
        let bytes = response.bytes().await.map_err(VerifyError::Transport)?;
        let identity: VerifiedIdentity = serde_json::from_slice(&bytes)?;

        debug!(
            client_id = %client_id,
            team_id = identity.team_id,
            api_token_id = identity.api_token_id,
            "Remote verification succeeded"
        );
        Ok(identity)
    }

    fn name(&self) -> &str {
        "http"
    }
}
