//! Conversation continuation identifiers

use crate::oracle::StructuredReply;
use serde::{Deserialize, Serialize};

/// The pair of identifiers that makes the next oracle call a follow-up
/// to the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationThread {
    pub conversation_id: Option<String>,
    pub parent_message_id: Option<String>,
}

impl ConversationThread {
    /// A thread with no history; the relay starts a new conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the identifiers to send with the next request
    pub fn current(&self) -> Self {
        self.clone()
    }

    /// Adopt the identifiers of a reply. Only called once a transition
    /// committed, so a failed or retried request never moves the thread.
    pub fn advance(&mut self, reply: &StructuredReply) {
        self.conversation_id = Some(reply.conversation_id.clone());
        self.parent_message_id = Some(reply.message_id.clone());
    }

    pub fn is_empty(&self) -> bool {
        self.conversation_id.is_none() && self.parent_message_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(conversation_id: &str, message_id: &str) -> StructuredReply {
        StructuredReply {
            response: json!({}),
            conversation_id: conversation_id.to_string(),
            message_id: message_id.to_string(),
        }
    }

    #[test]
    fn test_starts_empty() {
        let thread = ConversationThread::new();
        assert!(thread.is_empty());
        assert_eq!(thread.current(), ConversationThread::default());
    }

    #[test]
    fn test_advance_stores_ids_verbatim() {
        let mut thread = ConversationThread::new();
        thread.advance(&reply("c1", "m1"));
        assert_eq!(thread.conversation_id.as_deref(), Some("c1"));
        assert_eq!(thread.parent_message_id.as_deref(), Some("m1"));

        thread.advance(&reply("c1", "m2"));
        assert_eq!(thread.parent_message_id.as_deref(), Some("m2"));
        assert!(!thread.is_empty());
    }
}
