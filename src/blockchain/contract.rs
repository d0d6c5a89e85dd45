//! Binding to the record-keeping `Transactions` contract.
//!
//! # Responsibilities
//! - Read the full transfer history and the transfer counter
//! - Record a transfer through `addToBlockchain`
//! - Wait for the recording transaction to confirm

use alloy::primitives::{Address, U256};
use alloy::providers::DynProvider;
use alloy::sol;
use async_trait::async_trait;
use std::future::IntoFuture;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::transaction::wait_for_confirmation;
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, ConfirmationStatus, PendingTransfer, RawTransfer,
};

sol! {
    #[sol(rpc)]
    contract Transactions {
        struct TransferStruct {
            address sender;
            address receiver;
            uint amount;
            string message;
            uint256 timestamp;
            string keyword;
        }

        function addToBlockchain(address payable receiver, uint amount, string memory message, string memory keyword) public;

        function getAllTransactions() public view returns (TransferStruct[] memory);

        function getTransactionCount() public view returns (uint256);
    }
}

impl From<Transactions::TransferStruct> for RawTransfer {
    fn from(record: Transactions::TransferStruct) -> Self {
        Self {
            sender: record.sender,
            receiver: record.receiver,
            amount: record.amount,
            message: record.message,
            timestamp: record.timestamp,
            keyword: record.keyword,
        }
    }
}

/// Operations the workflow needs from the contract.
#[async_trait]
pub trait ContractClient: Send + Sync {
    /// Full transfer history, oldest first.
    async fn get_all_transactions(&self) -> BlockchainResult<Vec<RawTransfer>>;

    /// Number of recorded transfers.
    async fn get_transaction_count(&self) -> BlockchainResult<u64>;

    /// Submit `addToBlockchain` from `from`; returns once the node accepted it.
    async fn add_to_blockchain(
        &self,
        from: Address,
        to: Address,
        amount: U256,
        message: &str,
        keyword: &str,
    ) -> BlockchainResult<PendingTransfer>;

    /// Wait until the pending call is mined deep enough.
    async fn confirm(&self, pending: &PendingTransfer) -> BlockchainResult<ConfirmationStatus>;
}

/// Live contract reached through the RPC client.
pub struct TransactionsContract {
    client: BlockchainClient,
    instance: Transactions::TransactionsInstance<DynProvider>,
}

impl TransactionsContract {
    /// Bind the contract at `address`.
    pub fn new(client: BlockchainClient, address: &str) -> BlockchainResult<Self> {
        if address.is_empty() {
            return Err(BlockchainError::NotAvailable(
                "contract address is not configured".to_string(),
            ));
        }
        let address: Address = address
            .parse()
            .map_err(|e| BlockchainError::NotAvailable(format!("Invalid contract address: {}", e)))?;
        let instance = Transactions::new(address, client.provider().clone());
        tracing::info!(contract = %address, "Bound Transactions contract");
        Ok(Self { client, instance })
    }

    /// Address the binding points at.
    pub fn address(&self) -> Address {
        *self.instance.address()
    }

    async fn bounded<T, E, F>(&self, fut: F) -> BlockchainResult<T>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let secs = self.client.config().rpc_timeout_secs;
        match timeout(Duration::from_secs(secs), fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(BlockchainError::Rpc(e.to_string())),
            Err(_) => Err(BlockchainError::Timeout(secs)),
        }
    }
}

#[async_trait]
impl ContractClient for TransactionsContract {
    async fn get_all_transactions(&self) -> BlockchainResult<Vec<RawTransfer>> {
        let call = self.instance.getAllTransactions();
        let records = self.bounded(call.call()).await?;
        Ok(records.into_iter().map(RawTransfer::from).collect())
    }

    async fn get_transaction_count(&self) -> BlockchainResult<u64> {
        let call = self.instance.getTransactionCount();
        let count: U256 = self.bounded(call.call()).await?;
        if count > U256::from(u64::MAX) {
            return Err(BlockchainError::Malformed(format!(
                "transaction count {} overflows",
                count
            )));
        }
        Ok(count.to::<u64>())
    }

    async fn add_to_blockchain(
        &self,
        from: Address,
        to: Address,
        amount: U256,
        message: &str,
        keyword: &str,
    ) -> BlockchainResult<PendingTransfer> {
        let call = self
            .instance
            .addToBlockchain(to, amount, message.to_string(), keyword.to_string())
            .from(from);
        let pending = self.bounded(call.send()).await?;
        Ok(PendingTransfer {
            tx_hash: *pending.tx_hash(),
        })
    }

    async fn confirm(&self, pending: &PendingTransfer) -> BlockchainResult<ConfirmationStatus> {
        wait_for_confirmation(&self.client, pending.tx_hash).await
    }
}
