//! Document errors

use crate::value::DocType;
use retest_primitives::HexError;
use thiserror::Error;

/// Document model error
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Malformed input
    #[error("parse error: {0}")]
    Parse(String),

    /// Accessor used against the wrong variant
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Variant the caller asked for
        expected: DocType,
        /// Variant actually stored
        found: DocType,
    },

    /// Key lookup on an object that does not have it
    #[error("key '{0}' not found")]
    MissingKey(String),

    /// Two keys of one map canonicalize to the same key
    #[error("duplicate key '{0}' after canonicalization")]
    DuplicateKey(String),

    /// A designated hex field could not be canonicalized
    #[error("field '{key}': {source}")]
    Hex {
        /// Field name
        key: String,
        /// Underlying hex error
        source: HexError,
    },
}

/// Document result type
pub type DocumentResult<T> = Result<T, DocumentError>;
