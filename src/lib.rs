//! Wallet-driven value transfers recorded on a `Transactions` contract.

pub mod blockchain;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod storage;
pub mod workflow;

pub use config::AppConfig;
pub use lifecycle::Shutdown;
pub use workflow::TransactionWorkflow;
