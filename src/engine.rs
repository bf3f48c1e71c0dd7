//! Transition engine
//!
//! Turns (state, action) into a prompt, runs it through the JSON decoder and
//! hands back the oracle's answer as the next state. Owns the conversation
//! thread: only a successful transition moves it forward.

mod prompt;

#[cfg(test)]
mod proptests;

pub use prompt::{
    build_synthesize_actions_prompt, build_transition_prompt, SYNTHESIZE_REDUCER_PROMPT,
};

use crate::action::{into_action_list, ActionBatch};
use crate::error::BackendError;
use crate::oracle::{query_structured, OracleClient};
use crate::thread::ConversationThread;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Immutable facts about the app, fixed at construction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub description: Option<String>,
}

/// Outcome of one reduction
#[derive(Debug, Clone, PartialEq)]
pub enum Reduction {
    /// Nothing to do; no oracle call was made
    Unchanged,
    /// The oracle's proposed next state
    Replaced(Value),
}

/// The store's view of a transition function
#[async_trait]
pub trait Reducer: Send + Sync {
    async fn reduce(&self, state: &Value, batch: &ActionBatch) -> Result<Reduction, BackendError>;
}

#[derive(Debug, Default)]
struct Progress {
    thread: ConversationThread,
    /// At least one transition has been answered in this conversation
    has_started: bool,
}

/// Oracle-backed reducer
pub struct TransitionEngine<O> {
    oracle: O,
    manifest: Manifest,
    progress: Mutex<Progress>,
}

impl<O: OracleClient> TransitionEngine<O> {
    pub fn new(oracle: O, manifest: Manifest) -> Self {
        Self {
            oracle,
            manifest,
            progress: Mutex::new(Progress::default()),
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Identifiers the next request will carry
    pub fn thread(&self) -> ConversationThread {
        self.progress().thread.current()
    }

    pub fn has_started(&self) -> bool {
        self.progress().has_started
    }

    fn progress(&self) -> MutexGuard<'_, Progress> {
        // Progress is plain data; a panic elsewhere cannot leave it half-written
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask the oracle for the state that follows `batch`.
    ///
    /// An empty batch returns [`Reduction::Unchanged`] without a request.
    ///
    /// # Errors
    ///
    /// Transport and malformed-reply errors from the decoder. The thread and
    /// the first-turn flag are left untouched on error.
    pub async fn reduce(
        &self,
        state: &Value,
        batch: &ActionBatch,
    ) -> Result<Reduction, BackendError> {
        let Some(action) = batch.normalize() else {
            tracing::debug!("Empty action batch; skipping oracle");
            return Ok(Reduction::Unchanged);
        };

        let (thread, has_started) = {
            let progress = self.progress();
            (progress.thread.current(), progress.has_started)
        };
        let prompt = build_transition_prompt(state, &action, &self.manifest, has_started);

        let reply = query_structured(&self.oracle, &prompt, &thread).await?;

        {
            let mut progress = self.progress();
            progress.thread.advance(&reply);
            progress.has_started = true;
        }
        tracing::debug!(
            conversation_id = %reply.conversation_id,
            message_id = %reply.message_id,
            actions = batch.len(),
            "Transition answered"
        );

        Ok(Reduction::Replaced(reply.response))
    }

    /// Free-form prompt in the current conversation; raw reply text.
    ///
    /// # Errors
    ///
    /// [`BackendError::Transport`] when the round trip fails.
    pub async fn query(&self, prompt: &str) -> Result<String, BackendError> {
        let thread = self.thread();
        let reply = self.oracle.send(prompt, &thread).await?;
        Ok(reply.response)
    }

    /// Ask for reducer code equivalent to every transition answered so far.
    ///
    /// # Errors
    ///
    /// See [`TransitionEngine::query`].
    pub async fn synthesize_reducer(&self) -> Result<String, BackendError> {
        self.query(SYNTHESIZE_REDUCER_PROMPT).await
    }

    /// Ask which actions would accomplish `description`. A single action in
    /// the reply comes back as a one-element list.
    ///
    /// # Errors
    ///
    /// Transport and malformed-reply errors from the decoder.
    pub async fn synthesize_actions(&self, description: &str) -> Result<Vec<Value>, BackendError> {
        let thread = self.thread();
        let prompt = build_synthesize_actions_prompt(description);
        let reply = query_structured(&self.oracle, &prompt, &thread).await?;
        Ok(into_action_list(reply.response))
    }
}

#[async_trait]
impl<O: OracleClient> Reducer for TransitionEngine<O> {
    async fn reduce(&self, state: &Value, batch: &ActionBatch) -> Result<Reduction, BackendError> {
        TransitionEngine::reduce(self, state, batch).await
    }
}
