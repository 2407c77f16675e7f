//! RPC error types

use retest_document::DocumentError;
use thiserror::Error;

/// RPC session error
#[derive(Debug, Error)]
pub enum RpcError {
    /// Session could not be established
    #[error("Connection error: {0}")]
    Connection(String),

    /// Transport/network error during a call
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON-RPC error object returned by the client
    #[error("RPC error: {code} - {message}")]
    Rpc {
        /// Error code
        code: i64,
        /// Error message
        message: String,
    },

    /// `instance` called for a worker that never started a session
    #[error("No session for worker {0}")]
    NoSession(String),

    /// `session_start` called before any client configuration was set
    #[error("No client configuration set")]
    NotConfigured,

    /// Reply could not be represented as a document
    #[error("Malformed reply: {0}")]
    Document(#[from] DocumentError),
}

impl From<serde_json::Error> for RpcError {
    fn from(e: serde_json::Error) -> Self {
        RpcError::Transport(e.to_string())
    }
}

/// Result type for RPC operations
pub type RpcResult<T> = Result<T, RpcError>;
