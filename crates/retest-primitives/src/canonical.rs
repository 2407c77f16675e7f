//! Canonical hex forms for test-document fields
//!
//! Every field that carries an address, a 256-bit number, a hash or a byte
//! string is rewritten to one fixed representation before it is compared or
//! written out: lower-case, `0x` prefixed, even length. Applying the
//! canonicalization to its own output yields the same string.

use crate::address::Address;
use primitive_types::U256;
use thiserror::Error;

/// Shape of a hex-carrying field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HexKind {
    /// 20-byte address, left padded to 40 digits
    Address,
    /// 256-bit number in minimal big-endian form (at least one byte)
    Quantity,
    /// 32-byte value, left padded to 64 digits
    Hash,
    /// Arbitrary byte string
    Bytes,
}

/// Hex canonicalization error
#[derive(Debug, Error)]
pub enum HexError {
    /// Input is not hex
    #[error("invalid hex digits in '{0}'")]
    InvalidDigits(String),

    /// Input has no 0x prefix and is not a decimal number
    #[error("invalid decimal number '{0}'")]
    InvalidDecimal(String),

    /// Input is too wide for the field
    #[error("value '{value}' does not fit into {kind:?}")]
    Overflow {
        /// Target field shape
        kind: HexKind,
        /// Offending input
        value: String,
    },

    /// Negative integers have no hex form
    #[error("negative value {0} has no hex form")]
    Negative(i64),
}

fn strip_hex_prefix(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

fn check_digits(original: &str, digits: &str) -> Result<(), HexError> {
    if digits.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(HexError::InvalidDigits(original.to_string()))
    }
}

/// Parse a 256-bit number written either as `0x` hex or as decimal
pub fn parse_quantity(input: &str) -> Result<U256, HexError> {
    let s = input.trim();
    match strip_hex_prefix(s) {
        Some(digits) => {
            check_digits(input, digits)?;
            let significant = digits.trim_start_matches('0');
            if significant.is_empty() {
                return Ok(U256::zero());
            }
            if significant.len() > 64 {
                return Err(HexError::Overflow {
                    kind: HexKind::Quantity,
                    value: input.to_string(),
                });
            }
            U256::from_str_radix(significant, 16)
                .map_err(|_| HexError::InvalidDigits(input.to_string()))
        }
        None => {
            if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
                return Err(HexError::InvalidDecimal(input.to_string()));
            }
            U256::from_dec_str(s).map_err(|_| HexError::Overflow {
                kind: HexKind::Quantity,
                value: input.to_string(),
            })
        }
    }
}

/// Minimal even-length hex of a 256-bit number (`0 -> 0x00`)
pub fn canonical_quantity(value: U256) -> String {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(31);
    format!("0x{}", hex::encode(&bytes[first..]))
}

fn canonical_fixed(input: &str, kind: HexKind, width: usize) -> Result<String, HexError> {
    let digits = strip_hex_prefix(input.trim())
        .ok_or_else(|| HexError::InvalidDigits(input.to_string()))?;
    check_digits(input, digits)?;
    if digits.len() > width {
        return Err(HexError::Overflow {
            kind,
            value: input.to_string(),
        });
    }
    Ok(format!("0x{:0>width$}", digits.to_ascii_lowercase(), width = width))
}

fn canonical_bytes(input: &str) -> Result<String, HexError> {
    let s = input.trim();
    if s.is_empty() {
        return Ok("0x".to_string());
    }
    let digits = strip_hex_prefix(s).ok_or_else(|| HexError::InvalidDigits(input.to_string()))?;
    check_digits(input, digits)?;
    let lower = digits.to_ascii_lowercase();
    if lower.len() % 2 == 1 {
        Ok(format!("0x0{}", lower))
    } else {
        Ok(format!("0x{}", lower))
    }
}

/// Rewrite `input` into the canonical form for `kind`
pub fn canonical_hex(input: &str, kind: HexKind) -> Result<String, HexError> {
    match kind {
        HexKind::Address => {
            let trimmed = input.trim();
            if strip_hex_prefix(trimmed).is_none() {
                return Err(HexError::InvalidDigits(input.to_string()));
            }
            Address::from_hex_padded(trimmed)
                .map(|a| a.to_hex())
                .map_err(|_| HexError::Overflow {
                    kind,
                    value: input.to_string(),
                })
        }
        HexKind::Quantity => parse_quantity(input).map(canonical_quantity),
        HexKind::Hash => canonical_fixed(input, kind, 64),
        HexKind::Bytes => canonical_bytes(input),
    }
}

/// Canonical hex of an integer literal (YAML fillers write plain numbers)
pub fn canonical_int(value: i64, kind: HexKind) -> Result<String, HexError> {
    if value < 0 {
        return Err(HexError::Negative(value));
    }
    canonical_hex(&format!("0x{:x}", value), kind)
}
