//! Chain-specific types and error definitions.

use alloy::primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::config::schema::NetworkConfig;

/// Gas limit of a plain native value transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// EIP-1193 error code for a request the user rejected.
pub const USER_REJECTED_CODE: i64 = 4001;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Transaction was not confirmed within expected time.
    #[error("Transaction not confirmed after {0} seconds")]
    ConfirmationTimeout(u64),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Contract address missing or malformed.
    #[error("Contract not available: {0}")]
    NotAvailable(String),

    /// A value returned by the contract could not be interpreted.
    #[error("Malformed contract data: {0}")]
    Malformed(String),
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Errors surfaced by a wallet provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// The user declined the request in the wallet UI.
    #[error("User rejected the request")]
    UserRejected,

    /// The wallet answered with a JSON-RPC error.
    #[error("Wallet RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The wallet could not be reached.
    #[error("Wallet transport error: {0}")]
    Transport(String),

    /// The wallet answered with something other than the expected shape.
    #[error("Unexpected wallet response: {0}")]
    MalformedResponse(String),

    /// Signing key missing or invalid.
    #[error("Wallet key error: {0}")]
    Key(String),
}

impl WalletError {
    /// Map a JSON-RPC error payload, recognising user rejection.
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        if code == USER_REJECTED_CODE {
            WalletError::UserRejected
        } else {
            WalletError::Rpc {
                code,
                message: message.into(),
            }
        }
    }
}

/// Result type for wallet requests.
pub type WalletResult<T> = Result<T, WalletError>;

/// Record as stored by the contract's `getAllTransactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransfer {
    pub sender: Address,
    pub receiver: Address,
    /// Smallest-unit amount.
    pub amount: U256,
    pub message: String,
    /// Block timestamp in seconds.
    pub timestamp: U256,
    pub keyword: String,
}

/// Handle on a submitted contract call awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransfer {
    pub tx_hash: TxHash,
}

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Transaction is confirmed with required block depth.
    Confirmed { block_number: u64 },
    /// Transaction failed or was dropped.
    Failed(String),
}
