//! Error types for the test pipeline

use retest_document::DocumentError;
use retest_rpc::RpcError;
use retest_state::{CompareResult, StateError};
use thiserror::Error;

/// Pipeline error; every variant is reported against one file or test
#[derive(Error, Debug)]
pub enum SuiteError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Required field missing or of the wrong type in a test definition
    #[error("Schema error: {0}")]
    Schema(String),

    /// Compiled test does not match its source
    #[error("Stale test: {0}")]
    Stale(String),

    /// Source files do not follow the Filler/Copier naming convention
    #[error("Naming convention: {0}")]
    NamingConvention(String),

    /// Session could not be established
    #[error("Connection error: {0}")]
    Connection(String),

    /// Observed state differs from the expectation
    #[error("Comparison failed: {result}{}", format_details(.details))]
    Comparison {
        /// Classification of the first discrepancy
        result: CompareResult,
        /// Every discrepancy found
        details: Vec<String>,
    },

    /// Replayed test produced a different post state or log hash
    #[error("Mismatch: {0}")]
    Mismatch(String),

    /// Document error
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// RPC call failed
    #[error("RPC error: {0}")]
    Rpc(RpcError),

    /// Account state error
    #[error("State error: {0}")]
    State(#[from] StateError),
}

fn format_details(details: &[String]) -> String {
    if details.is_empty() {
        String::new()
    } else {
        format!(" ({})", details.join("; "))
    }
}

impl SuiteError {
    /// Surface a failed comparison
    pub fn comparison(result: CompareResult, details: Vec<String>) -> Self {
        SuiteError::Comparison { result, details }
    }
}

impl From<RpcError> for SuiteError {
    fn from(e: RpcError) -> Self {
        match e {
            RpcError::Connection(_) | RpcError::NotConfigured => {
                SuiteError::Connection(e.to_string())
            }
            other => SuiteError::Rpc(other),
        }
    }
}

/// Result type for the pipeline
pub type SuiteResult<T> = Result<T, SuiteError>;
