//! # Core Error Types
//!
//! Centralized error definitions for the core-logic crate.
//! All errors implement `std::error::Error` and `std::fmt::Display`.

use thiserror::Error;

/// Startup configuration errors. These are fatal.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Missing required configuration field: '{field}'")]
    MissingField { field: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("I/O error reading {path}: {msg}")]
    IoError { path: String, msg: String },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("No accounts found in {path}")]
    NoAccounts { path: String },
}

/// Proxy descriptor errors. Always recovered by falling back to a direct connection.
#[derive(Error, Debug, Clone)]
pub enum ProxyError {
    #[error("Invalid proxy URL '{raw}': {reason}")]
    Parse { raw: String, reason: String },

    #[error("Unable to build proxy transport for '{raw}': {reason}")]
    Build { raw: String, reason: String },
}

/// Network-level failures: the request never produced an HTTP response.
#[derive(Error, Debug, Clone)]
pub enum NetworkError {
    #[error("Proxy connection failed: connection to {endpoint} failed: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("Proxy connection failed: request to {endpoint} timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64, endpoint: String },

    #[error("Request to {endpoint} failed: {reason}")]
    Request { endpoint: String, reason: String },
}

/// The remote API answered, but not with something usable.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("HTTP error {status_code} from {endpoint}: {body}")]
    HttpStatus {
        status_code: u16,
        endpoint: String,
        body: String,
    },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

/// Error surfaced by a single API call.
#[derive(Error, Debug, Clone)]
pub enum RequestError {
    #[error(transparent)]
    Transport(#[from] NetworkError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl RequestError {
    /// True when the failure happened below HTTP (refused, reset, timed out).
    pub fn is_transport(&self) -> bool {
        matches!(self, RequestError::Transport(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RequestError::Transport(_) => "transport",
            RequestError::Api(_) => "api",
        }
    }
}
