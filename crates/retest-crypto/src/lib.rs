//! # retest-crypto
//!
//! Hashing used by the harness.
//!
//! - Keccak-256
//! - Source fingerprints for staleness detection of compiled tests

#![warn(missing_docs)]
#![warn(clippy::all)]

mod hash;

pub use hash::{keccak256, source_hash};
