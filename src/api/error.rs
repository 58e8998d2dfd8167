//! API Error Types
//!
//! Errors that stop the HTTP/WebSocket listener itself.

use thiserror::Error;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Binding or accepting on the listener failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
