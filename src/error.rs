//! Backend error taxonomy

use crate::oracle::OracleError;
use crate::queue::QueueError;
use thiserror::Error;

/// Why a transition or auxiliary oracle call did not produce a value
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network failure or an error reported by the relay. Not retried.
    #[error("oracle transport failed: {0}")]
    Transport(#[from] OracleError),

    /// The reply was still not JSON after every allowed attempt
    #[error("oracle reply was not valid JSON after {attempts} attempts: {source}")]
    MalformedReply {
        raw: String,
        #[source]
        source: serde_json::Error,
        attempts: u32,
    },

    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl BackendError {
    /// The last raw reply, for malformed-reply errors
    pub fn raw_reply(&self) -> Option<&str> {
        match self {
            Self::MalformedReply { raw, .. } => Some(raw),
            Self::Transport(_) | Self::Queue(_) => None,
        }
    }
}
