//! Oracle client abstraction
//!
//! One textual round trip against the relay: prompt in, reply text plus
//! continuation identifiers out. Ordering and retries live above this layer.

mod error;
mod relay;
mod structured;
mod types;

#[cfg(test)]
pub mod testing;

pub use error::{OracleError, OracleErrorKind};
pub use relay::RelayClient;
pub use structured::{query_structured, StructuredReply, MAX_DECODE_ATTEMPTS};
pub use types::{OracleReply, OracleRequest};

use crate::thread::ConversationThread;
use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for oracle transports
#[async_trait]
pub trait OracleClient: Send + Sync {
    /// Send one prompt, continuing `thread` when it carries identifiers
    async fn send(
        &self,
        prompt: &str,
        thread: &ConversationThread,
    ) -> Result<OracleReply, OracleError>;

    /// Human-readable name of the endpoint, used in logs
    fn endpoint(&self) -> &str;
}

#[async_trait]
impl<T: OracleClient + ?Sized> OracleClient for Arc<T> {
    async fn send(
        &self,
        prompt: &str,
        thread: &ConversationThread,
    ) -> Result<OracleReply, OracleError> {
        (**self).send(prompt, thread).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

/// Logging wrapper for oracle clients
pub struct LoggingOracle<O> {
    inner: O,
}

impl<O: OracleClient> LoggingOracle<O> {
    pub fn new(inner: O) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<O: OracleClient> OracleClient for LoggingOracle<O> {
    async fn send(
        &self,
        prompt: &str,
        thread: &ConversationThread,
    ) -> Result<OracleReply, OracleError> {
        tracing::debug!(
            endpoint = %self.inner.endpoint(),
            conversation_id = thread.conversation_id.as_deref().unwrap_or("-"),
            "Q: {prompt}"
        );

        let start = std::time::Instant::now();
        let result = self.inner.send(prompt, thread).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::debug!("A: {}", reply.response);
                tracing::info!(
                    endpoint = %self.inner.endpoint(),
                    duration_ms = %duration.as_millis(),
                    prompt_len = prompt.len(),
                    response_len = reply.response.len(),
                    conversation_id = %reply.conversation_id,
                    "Oracle request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %self.inner.endpoint(),
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    relay_reported = e.kind.is_relay_reported(),
                    "Oracle request failed"
                );
            }
        }

        result
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}
