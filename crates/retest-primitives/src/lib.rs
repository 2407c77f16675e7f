//! # retest-primitives
//!
//! Primitive types shared by the retest harness.
//!
//! - `Address` (20 bytes) and `H256` (32 bytes)
//! - Canonical hex forms for test-document fields (`HexKind`)

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod hash;
pub mod canonical;

pub use address::{Address, AddressError};
pub use error::PrimitiveError;
pub use hash::{HashError, H256};
pub use canonical::{canonical_hex, canonical_int, canonical_quantity, parse_quantity, HexError, HexKind};

// Re-export primitive-types for U256
pub use primitive_types::U256;
