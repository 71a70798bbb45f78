//! Protocol error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid protocol version: '{0}'")]
    InvalidVersion(String),

    #[error("Unsupported server version: {0}")]
    UnsupportedServerVersion(String),

    #[error("Unexpected HTTP status {status}")]
    UnexpectedStatus { status: u16 },

    #[error("Response body is missing")]
    MissingBody,

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}
