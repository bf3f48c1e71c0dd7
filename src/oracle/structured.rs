//! JSON-only replies with bounded retry
//!
//! The oracle is a text generator, so "reply with JSON only" is a request,
//! not a guarantee. A reply that does not parse is re-asked from the same
//! continuation point a bounded number of times.

use super::{OracleClient, OracleReply};
use crate::error::BackendError;
use crate::thread::ConversationThread;
use serde_json::Value;

/// Total attempts, the first one included
pub const MAX_DECODE_ATTEMPTS: u32 = 3;

/// An [`OracleReply`] whose `response` parsed as JSON
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredReply {
    pub response: Value,
    pub conversation_id: String,
    pub message_id: String,
}

impl StructuredReply {
    fn parse(reply: OracleReply) -> Result<Self, (String, serde_json::Error)> {
        match serde_json::from_str(&reply.response) {
            Ok(response) => Ok(Self {
                response,
                conversation_id: reply.conversation_id,
                message_id: reply.message_id,
            }),
            Err(e) => Err((reply.response, e)),
        }
    }
}

/// Send `prompt` and parse the reply as JSON, re-sending the same prompt
/// on parse failure.
///
/// Every attempt uses the same `thread`; nothing here advances it.
///
/// # Errors
///
/// [`BackendError::Transport`] as soon as any attempt fails on the wire, or
/// [`BackendError::MalformedReply`] after [`MAX_DECODE_ATTEMPTS`] replies in a
/// row failed to parse.
pub async fn query_structured<O: OracleClient + ?Sized>(
    oracle: &O,
    prompt: &str,
    thread: &ConversationThread,
) -> Result<StructuredReply, BackendError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let reply = oracle.send(prompt, thread).await?;
        match StructuredReply::parse(reply) {
            Ok(structured) => return Ok(structured),
            Err((raw, source)) if attempt >= MAX_DECODE_ATTEMPTS => {
                return Err(BackendError::MalformedReply {
                    raw,
                    source,
                    attempts: attempt,
                });
            }
            Err((_, source)) => {
                tracing::warn!(attempt, error = %source, "Oracle reply was not JSON; retrying");
            }
        }
    }
}
