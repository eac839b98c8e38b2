use thiserror::Error;

use crate::protocol::error_codes;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ToolError {
    pub fn code(&self) -> i64 {
        match self {
            Self::InvalidArguments(_) => error_codes::INVALID_PARAMS,
            Self::Serialize(_) => error_codes::INTERNAL_ERROR,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid log filter '{value}': {reason}")]
    LogFilter { value: String, reason: String },

    #[error("telemetry error: {0}")]
    Telemetry(String),
}

/// Why an inbound frame could not be turned into a request body.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid request line {0:?}")]
    RequestLine(String),

    #[error("unexpected eof while reading frame headers")]
    UnterminatedHeaders,

    #[error("missing content-length header")]
    MissingLength,

    #[error("invalid content-length {0:?}")]
    InvalidLength(String),

    #[error("frame of {declared} bytes exceeds the {limit} byte limit")]
    TooLarge { declared: u64, limit: usize },

    #[error("truncated frame body: {0}")]
    Truncated(#[source] std::io::Error),
}

impl FrameError {
    /// Status for an HTTP client whose request could not be framed.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::TooLarge { .. } => 413,
            _ => 400,
        }
    }
}
