//! Oracle transport error types

use thiserror::Error;

/// Transport-level failure of a single oracle round trip
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct OracleError {
    pub kind: OracleErrorKind,
    pub message: String,
}

impl OracleError {
    pub fn new(kind: OracleErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(OracleErrorKind::Network, message)
    }

    pub fn relay(message: impl Into<String>) -> Self {
        Self::new(OracleErrorKind::Relay, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(OracleErrorKind::InvalidRequest, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(OracleErrorKind::ServerError, message)
    }

    pub fn envelope(message: impl Into<String>) -> Self {
        Self::new(OracleErrorKind::Envelope, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(OracleErrorKind::Unknown, message)
    }
}

/// Error classification
///
/// None of these are retried by the core; the kind only tells the error
/// handler where the failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleErrorKind {
    /// Connection refused, timeout, truncated body
    Network,
    /// The relay answered with an `{ "error": ... }` envelope
    Relay,
    /// HTTP 400 without an error envelope
    InvalidRequest,
    /// HTTP 5xx without an error envelope
    ServerError,
    /// Success status but the body is not a reply envelope
    Envelope,
    /// Anything else
    Unknown,
}

impl OracleErrorKind {
    /// Whether the relay itself produced the failure (as opposed to the wire)
    pub fn is_relay_reported(self) -> bool {
        matches!(self, Self::Relay | Self::InvalidRequest | Self::ServerError)
    }
}
