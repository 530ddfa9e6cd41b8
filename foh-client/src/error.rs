//! Client error types

use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// 401/403 on an `/api` route, or a rejected credential; callers purge
    /// the stored credential on this
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Rejected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server rejected the operation
    #[error("Server error: {0}")]
    Server(String),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Streaming connection failure
    #[error("Stream error: {0}")]
    Stream(String),

    /// Durable storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ClientError {
    /// True for errors that must force the session to anonymous.
    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth(_))
    }

    /// Coarse class used to de-duplicate transient error toasts.
    pub fn class(&self) -> &'static str {
        match self {
            ClientError::Http(_) => "http",
            ClientError::Auth(_) => "auth",
            ClientError::Validation(_) => "validation",
            ClientError::NotFound(_) => "not-found",
            ClientError::Server(_) => "server",
            ClientError::InvalidResponse(_) => "invalid-response",
            ClientError::Serialization(_) => "serialization",
            ClientError::Stream(_) => "stream",
            ClientError::Storage(_) => "storage",
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
