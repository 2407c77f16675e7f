//! # retest-document
//!
//! Ordered, semi-structured document model used for every test file the
//! harness reads or writes.
//!
//! - Insertion-ordered objects with explicit repositioning
//! - JSON and YAML parsing, compact and pretty JSON output
//! - Comment stripping (`//`-prefixed keys) and hex canonicalization passes

#![warn(missing_docs)]
#![warn(clippy::all)]

mod codec;
mod error;
mod transform;
mod value;

pub use error::{DocumentError, DocumentResult};
pub use transform::COMMENT_PREFIX;
pub use value::{DocType, Document, Object};

// Re-export for field tables passed to `canonicalize_hex_fields`
pub use retest_primitives::HexKind;
