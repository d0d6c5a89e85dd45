//! Mapping of contract records into displayable history entries.

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::blockchain::types::{BlockchainError, BlockchainResult, RawTransfer};
use crate::blockchain::units::{display_timestamp, format_amount, timestamp_from_chain};

/// One recorded transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub address_from: Address,
    pub address_to: Address,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub keyword: String,
    /// Decimal amount in whole units.
    pub amount: String,
    /// Smallest-unit amount as stored on chain.
    pub amount_raw: U256,
}

impl Transaction {
    /// Convert a raw contract record.
    pub fn from_raw(raw: RawTransfer) -> BlockchainResult<Self> {
        let timestamp = timestamp_from_chain(raw.timestamp).ok_or_else(|| {
            BlockchainError::Malformed(format!("timestamp {} out of range", raw.timestamp))
        })?;
        Ok(Self {
            address_from: raw.sender,
            address_to: raw.receiver,
            timestamp,
            message: raw.message,
            keyword: raw.keyword,
            amount: format_amount(raw.amount),
            amount_raw: raw.amount,
        })
    }

    /// Timestamp in local time for display.
    pub fn display_timestamp(&self) -> String {
        display_timestamp(&self.timestamp)
    }
}

/// Convert a whole history, preserving order. Fails as a unit.
pub fn map_transfers(raw: Vec<RawTransfer>) -> BlockchainResult<Vec<Transaction>> {
    raw.into_iter().map(Transaction::from_raw).collect()
}
