//! Error types for the messaging core.
//!
//! Handlers never surface these to the sending server: they are logged and
//! turned into a no-op or an empty reply. They exist so the transport loop,
//! the outbound API and configuration loading can report what went wrong.

use std::time::Duration;

/// Enumeration of possible messaging errors.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// The broker could not hand the message to the transport
    #[error("Broker error: {0}")]
    Broker(String),

    /// A message builder was finished without a required field
    #[error("Incomplete message: missing {0}")]
    IncompleteMessage(&'static str),

    /// A payload did not have the shape its message type requires
    #[error("Malformed payload: {0}")]
    Payload(#[from] PayloadError),

    /// A message could not be encoded to or decoded from the wire format
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A local store (database or cache) failed
    #[error("Store error: {0}")]
    Store(String),

    /// The teleport executor rejected or failed a teleport
    #[error("Teleport error: {0}")]
    Teleport(String),

    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// An outstanding request did not receive its reply in time
    #[error("Request {request_id} timed out after {after:?}")]
    Timeout { request_id: String, after: Duration },

    /// An outstanding request was dropped before it could complete
    #[error("Request {0} was cancelled")]
    Cancelled(String),
}

/// Ways in which a payload can fail to match its message type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// The payload holds no data of the expected shape
    #[error("expected {0} payload")]
    Missing(&'static str),

    /// An API RTP request did not split into exactly three fields
    #[error("expected 3 NUL-separated fields, found {found} in {raw:?}")]
    FieldCount { found: usize, raw: String },

    /// An API RTP request count was not a non-negative integer
    #[error("invalid requested count {0:?}")]
    InvalidCount(String),

    /// A home or warp identifier was not a UUID
    #[error("invalid identifier {0:?}")]
    InvalidId(String),
}
