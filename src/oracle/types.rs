//! Relay wire types

use super::OracleError;
use crate::thread::ConversationThread;
use serde::{Deserialize, Serialize};

/// Body of `POST <base>/query`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<String>,
}

impl OracleRequest {
    /// Merge the thread's continuation identifiers with the prompt
    pub fn new(prompt: impl Into<String>, thread: &ConversationThread) -> Self {
        Self {
            prompt: prompt.into(),
            conversation_id: thread.conversation_id.clone(),
            parent_message_id: thread.parent_message_id.clone(),
        }
    }
}

/// A successful relay answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleReply {
    pub response: String,
    pub conversation_id: String,
    pub message_id: String,
}

/// Everything the relay may send back, success or failure.
///
/// The relay is allowed to answer with nothing but `error`, so every field is
/// optional until [`RelayEnvelope::into_reply`] checks them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RelayEnvelope {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
}

impl RelayEnvelope {
    pub fn into_reply(self) -> Result<OracleReply, OracleError> {
        if let Some(error) = self.error {
            return Err(OracleError::relay(error));
        }
        match (self.response, self.conversation_id, self.message_id) {
            (Some(response), Some(conversation_id), Some(message_id)) => Ok(OracleReply {
                response,
                conversation_id,
                message_id,
            }),
            (response, conversation_id, message_id) => {
                let missing: Vec<&str> = [
                    ("response", response.is_none()),
                    ("conversationId", conversation_id.is_none()),
                    ("messageId", message_id.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                Err(OracleError::envelope(format!(
                    "Relay reply is missing {}",
                    missing.join(", ")
                )))
            }
        }
    }
}
