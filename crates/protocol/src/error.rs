//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding client messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("expected a text frame")]
    NotText,
}
