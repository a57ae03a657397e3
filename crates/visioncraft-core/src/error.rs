//! Error types module
//!
//! Every failure the client can produce is a `ClientError`. The variants keep the
//! transport, HTTP status, and application-level failures apart so callers can branch
//! on `kind()` instead of matching on message text, while `Display` yields the
//! user-facing message.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for failures reported by the service itself
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Flat classification of a `ClientError`, cheap to copy into UI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    HttpStatus,
    Application,
    Decode,
    NoAsset,
    InvalidParams,
    Config,
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connection refused, DNS failure, timeout: the request never produced a response.
    #[error("{0}")]
    Transport(String),

    /// Non-2xx response. `message` is the server's `error` field when it sent one.
    #[error("{message}")]
    HttpStatus { status: u16, message: String },

    /// 2xx response whose body declared `success: false`.
    #[error("{0}")]
    Application(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("No uploaded image: upload an image before running {0}")]
    NoAsset(&'static str),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Build the failure for a non-2xx response, preferring the server-supplied text.
    pub fn from_status(status: u16, server_message: Option<String>) -> Self {
        let message = server_message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP error: {}", status));
        ClientError::HttpStatus { status, message }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Transport(_) => ErrorKind::Transport,
            ClientError::HttpStatus { .. } => ErrorKind::HttpStatus,
            ClientError::Application(_) => ErrorKind::Application,
            ClientError::Decode(_) => ErrorKind::Decode,
            ClientError::NoAsset(_) => ErrorKind::NoAsset,
            ClientError::InvalidParams(_) => ErrorKind::InvalidParams,
            ClientError::Config(_) => ErrorKind::Config,
            ClientError::Io(_) => ErrorKind::Io,
        }
    }

    /// HTTP status of the response that caused this error, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Machine-readable error code (e.g., "HTTP_STATUS_ERROR")
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Transport(_) => "TRANSPORT_ERROR",
            ClientError::HttpStatus { .. } => "HTTP_STATUS_ERROR",
            ClientError::Application(_) => "APPLICATION_FAILURE",
            ClientError::Decode(_) => "DECODE_ERROR",
            ClientError::NoAsset(_) => "NO_ASSET",
            ClientError::InvalidParams(_) => "INVALID_PARAMS",
            ClientError::Config(_) => "CONFIG_ERROR",
            ClientError::Io(_) => "IO_ERROR",
        }
    }

    /// Whether the same request could succeed if the user simply tried again.
    /// Nothing is retried automatically.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            ClientError::NoAsset(_) | ClientError::InvalidParams(_) => LogLevel::Debug,
            ClientError::Application(_) => LogLevel::Warn,
            ClientError::HttpStatus { status, .. } if *status < 500 => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}
