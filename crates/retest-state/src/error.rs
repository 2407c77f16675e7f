//! State error types

use retest_document::DocumentError;
use retest_primitives::HexError;
use retest_rpc::RpcError;
use thiserror::Error;

/// Errors building or fetching account state
#[derive(Debug, Error)]
pub enum StateError {
    /// Required field missing or of the wrong type
    #[error("schema error: {0}")]
    Schema(String),

    /// Field value is not valid hex for its kind
    #[error("invalid value for {field}: {source}")]
    Hex {
        /// Dotted path of the field
        field: String,
        /// Underlying error
        source: HexError,
    },

    /// Document access failed
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Remote call failed
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),
}

/// Result type for state operations
pub type StateResult<T> = Result<T, StateError>;
