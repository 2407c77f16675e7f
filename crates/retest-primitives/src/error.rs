//! Common error types for primitives

use crate::address::AddressError;
use crate::hash::HashError;
use crate::canonical::HexError;
use thiserror::Error;

/// Primitive operation error
#[derive(Debug, Error)]
pub enum PrimitiveError {
    /// Address error
    #[error("address error: {0}")]
    Address(#[from] AddressError),

    /// Hash error
    #[error("hash error: {0}")]
    Hash(#[from] HashError),

    /// Hex canonicalization error
    #[error("hex error: {0}")]
    Hex(#[from] HexError),
}
