//! Shared error type across promux crates.

use thiserror::Error;

/// Stable error classes, used as the `kind` field in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid startup configuration.
    Config,
    /// Request to a target could not be sent or got no response.
    Transport,
    /// Target answered with a non-200 status.
    Status,
    /// Target sent a broken gzip stream.
    Decompress,
    /// Exposition text could not be parsed.
    Decode,
    /// Metric families could not be serialized.
    Encode,
    /// Empty or missing arguments to a transformation.
    InvalidInput,
    /// Anything else (bind failures, client construction).
    Internal,
}

impl ErrorKind {
    /// String representation used in structured logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Config => "CONFIG",
            ErrorKind::Transport => "TRANSPORT",
            ErrorKind::Status => "STATUS",
            ErrorKind::Decompress => "DECOMPRESS",
            ErrorKind::Decode => "DECODE",
            ErrorKind::Encode => "ENCODE",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PromuxError>;

/// Unified error type used by core and sidecar.
#[derive(Debug, Error)]
pub enum PromuxError {
    #[error("config: {0}")]
    Config(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("target returned HTTP status {status}")]
    Status { status: u16 },
    #[error("decompress: {0}")]
    Decompress(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("encode: {0}")]
    Encode(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl PromuxError {
    /// Map the error to its stable kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PromuxError::Config(_) => ErrorKind::Config,
            PromuxError::Transport(_) => ErrorKind::Transport,
            PromuxError::Status { .. } => ErrorKind::Status,
            PromuxError::Decompress(_) => ErrorKind::Decompress,
            PromuxError::Decode(_) => ErrorKind::Decode,
            PromuxError::Encode(_) => ErrorKind::Encode,
            PromuxError::InvalidInput(_) => ErrorKind::InvalidInput,
            PromuxError::Internal(_) => ErrorKind::Internal,
        }
    }
}
