//! Oracle-backed store
//!
//! Wires one relay client, one transition engine and one serial queue to a
//! [`Store`]. Everything that talks to the oracle (transitions, free-form
//! queries, synthesis) goes through the same queue, so the conversation sees
//! requests in the order they were made.


use crate::config::{BackendConfig, ConfigError};
use crate::engine::{Manifest, Reducer, TransitionEngine};
use crate::error::BackendError;
use crate::oracle::{LoggingOracle, OracleClient, RelayClient};
use crate::queue::SerialQueue;
use crate::store::{is_busy, Store};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// A store plus the oracle operations that share its conversation
pub struct OracleBackend<O = LoggingOracle<RelayClient>> {
    engine: Arc<TransitionEngine<O>>,
    queue: SerialQueue,
    store: Store,
}

impl OracleBackend<LoggingOracle<RelayClient>> {
    /// Build a backend talking to the relay at `config.api_base`.
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the relay client cannot be built.
    pub fn connect(initial: Value, config: BackendConfig) -> Result<Self, ConfigError> {
        let relay = RelayClient::from_config(&config)?;
        tracing::info!(endpoint = %relay.query_url(), "Oracle relay configured");
        Ok(Self::with_oracle(initial, LoggingOracle::new(relay), config))
    }
}

impl<O: OracleClient + 'static> OracleBackend<O> {
    /// Build a backend around any oracle transport.
    /// Must be called from within a Tokio runtime.
    pub fn with_oracle(initial: Value, oracle: O, config: BackendConfig) -> Self {
        let manifest = Manifest {
            description: config.description.clone(),
        };
        let engine = Arc::new(TransitionEngine::new(oracle, manifest));
        let queue = SerialQueue::new();
        let reducer: Arc<dyn Reducer> = engine.clone();
        let store = Store::new(initial, reducer, queue.clone(), config.error_handler.clone());

        if config.log_states {
            // The subscription lives as long as the store
            let _ = store.subscribe(|state| {
                if !is_busy(state) {
                    tracing::info!(state = %state.data, "==> state committed");
                }
            });
        }

        Self {
            engine,
            queue,
            store,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn engine(&self) -> &TransitionEngine<O> {
        &self.engine
    }

    /// Free-form prompt in the store's conversation, queued behind any
    /// pending transitions. Resolves to the raw reply text.
    pub fn query(
        &self,
        prompt: impl Into<String>,
    ) -> impl Future<Output = Result<String, BackendError>> + Send + 'static {
        let engine = self.engine.clone();
        let prompt = prompt.into();
        let ticket = self.queue.submit(async move { engine.query(&prompt).await });
        async move { ticket.await? }
    }

    /// Ask the oracle for reducer code matching every transition so far
    pub fn synthesize_reducer(
        &self,
    ) -> impl Future<Output = Result<String, BackendError>> + Send + 'static {
        let engine = self.engine.clone();
        let ticket = self.queue.submit(async move { engine.synthesize_reducer().await });
        async move { ticket.await? }
    }

    /// Ask which actions would accomplish `description`. The actions are
    /// returned, not dispatched.
    pub fn synthesize_actions(
        &self,
        description: impl Into<String>,
    ) -> impl Future<Output = Result<Vec<Value>, BackendError>> + Send + 'static {
        let engine = self.engine.clone();
        let description = description.into();
        let ticket = self
            .queue
            .submit(async move { engine.synthesize_actions(&description).await });
        async move { ticket.await? }
    }

    /// Resolve once every queued transition and query has settled
    pub async fn drain(&self) {
        self.queue.drain().await;
    }
}
