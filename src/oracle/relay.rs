//! HTTP relay client
//!
//! Talks to a relay exposing `POST <base>/query`. The relay owns the session
//! with the underlying chat service; this side only speaks its JSON contract.

use super::types::{OracleReply, OracleRequest, RelayEnvelope};
use super::{OracleClient, OracleError};
use crate::config::{BackendConfig, ConfigError};
use crate::thread::ConversationThread;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;

/// Production oracle transport
pub struct RelayClient {
    client: Client,
    query_url: Url,
}

impl RelayClient {
    /// Build a client for the relay at `api_base`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the base is not an absolute URL or the
    /// HTTP client cannot be constructed.
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let query_url = Url::parse(&format!("{}/query", api_base.trim_end_matches('/')))
            .map_err(|e| ConfigError::InvalidApiBase {
                api_base: api_base.to_string(),
                reason: e.to_string(),
            })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { client, query_url })
    }

    /// Build a client from backend configuration.
    ///
    /// # Errors
    ///
    /// See [`RelayClient::new`].
    pub fn from_config(config: &BackendConfig) -> Result<Self, ConfigError> {
        Self::new(&config.api_base, config.request_timeout)
    }

    pub fn query_url(&self) -> &Url {
        &self.query_url
    }

    fn classify_error(status: StatusCode, body: &str) -> OracleError {
        match status.as_u16() {
            400 => OracleError::invalid_request(format!("Invalid request: {body}")),
            500..=599 => OracleError::server_error(format!("Relay error: {body}")),
            _ => OracleError::unknown(format!("HTTP {status}: {body}")),
        }
    }
}

#[async_trait]
impl OracleClient for RelayClient {
    async fn send(
        &self,
        prompt: &str,
        thread: &ConversationThread,
    ) -> Result<OracleReply, OracleError> {
        let request = OracleRequest::new(prompt, thread);

        let response = self
            .client
            .post(self.query_url.clone())
            .header("accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    OracleError::network(format!("Connection failed: {e}"))
                } else {
                    OracleError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OracleError::network(format!("Failed to read response: {e}")))?;

        // An `error` field is authoritative whatever the status says
        let envelope = serde_json::from_str::<RelayEnvelope>(&body);
        if let Ok(RelayEnvelope {
            error: Some(error), ..
        }) = &envelope
        {
            return Err(OracleError::relay(error.clone()));
        }

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        envelope
            .map_err(|e| {
                OracleError::envelope(format!("Failed to parse relay reply: {e} - body: {body}"))
            })?
            .into_reply()
    }

    fn endpoint(&self) -> &str {
        self.query_url.as_str()
    }
}
