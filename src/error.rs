//! Error types for the scan client.

use thiserror::Error;

/// Rejections raised by local form validation, before anything is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a target IP address")]
    EmptyTarget,

    #[error("Port range start must be less than or equal to port range end")]
    RangeInverted { start: i64, end: i64 },

    #[error("Port range must be between 1 and 65535")]
    RangeOutOfBounds { start: i64, end: i64 },
}

/// Failures talking to the scanning backend.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid backend URL: {0}")]
    InvalidBaseUrl(String),

    #[error("scan not found: {scan_id}")]
    NotFound { scan_id: String },

    /// Non-success status from the backend.
    #[error("backend returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("http request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ClientError>;
