//! Conversions between user-facing values and on-chain integers.
//!
//! # Responsibilities
//! - Parse decimal amount strings into 18-decimal smallest units
//! - Render smallest-unit amounts back as trimmed decimal strings
//! - Convert on-chain second timestamps into instants
//!
//! # Design Decisions
//! - Precision beyond 18 fractional digits is rejected, never rounded
//! - Timestamps are kept as `DateTime<Utc>`; local rendering happens at display time

use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::U256;
use chrono::{DateTime, Local, Utc};
use thiserror::Error;

/// Fixed-point precision of the native currency.
pub const DECIMALS: usize = 18;

/// Errors produced when parsing a user-supplied amount.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("amount must not be negative")]
    Negative,

    #[error("amount must be greater than zero")]
    Zero,

    #[error("amount has more than 18 fractional digits")]
    TooPrecise,

    #[error("invalid amount '{0}'")]
    Invalid(String),
}

/// Parse a decimal string (e.g. `"0.01"`) into the smallest unit.
pub fn parse_amount(input: &str) -> Result<U256, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(AmountError::Negative);
    }

    let mut parts = trimmed.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();
    let well_formed = !(whole.is_empty() && fraction.is_empty())
        && whole.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit());
    if !well_formed {
        return Err(AmountError::Invalid(trimmed.to_string()));
    }
    if fraction.len() > DECIMALS {
        return Err(AmountError::TooPrecise);
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let normalized = if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    };

    let value = parse_ether(&normalized).map_err(|e| AmountError::Invalid(e.to_string()))?;
    if value.is_zero() {
        return Err(AmountError::Zero);
    }
    Ok(value)
}

/// Render a smallest-unit amount as a decimal string without trailing zeros.
pub fn format_amount(value: U256) -> String {
    let formatted = format_ether(value);
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => formatted,
    }
}

/// Hex quantity encoding used by wallet JSON-RPC (`0x`-prefixed, no padding).
pub fn to_hex_quantity(value: U256) -> String {
    format!("{:#x}", value)
}

/// Convert an on-chain timestamp in seconds into an instant.
///
/// Returns `None` when the value does not fit a representable date.
pub fn timestamp_from_chain(seconds: U256) -> Option<DateTime<Utc>> {
    if seconds > U256::from(i64::MAX as u64) {
        return None;
    }
    let millis = (seconds.to::<u64>() as i64).checked_mul(1000)?;
    DateTime::<Utc>::from_timestamp_millis(millis)
}

/// Local-time rendering in the `month/day/year, h:mm:ss AM` style.
pub fn display_timestamp(instant: &DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}
