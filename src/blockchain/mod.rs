//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! NetworkConfig (+ optional private key from the environment)
//!     → client.rs (RPC connection with timeouts and failover)
//!     → wallet.rs (account access, transfer approval)
//!     → contract.rs (history, counter, addToBlockchain)
//!     → transaction.rs (transfer building, confirmation polling)
//!     → units.rs (decimal amounts, timestamps)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC reads have configurable timeouts
//! - Wallet approval waits are unbounded here; callers cancel them

pub mod client;
pub mod contract;
pub mod transaction;
pub mod types;
pub mod units;
pub mod wallet;

pub use client::BlockchainClient;
pub use contract::{ContractClient, TransactionsContract};
pub use types::{
    BlockchainError, ChainId, ConfirmationStatus, PendingTransfer, RawTransfer, WalletError,
};
pub use wallet::{LocalWallet, RpcWallet, TransferRequest, WalletProvider, WalletRequest};
