//! Shared test doubles for workflow integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

use transfer_dapp::blockchain::types::{BlockchainError, BlockchainResult, WalletResult};
use transfer_dapp::blockchain::{
    ConfirmationStatus, ContractClient, PendingTransfer, RawTransfer, WalletError,
    WalletProvider, WalletRequest,
};

pub fn alice() -> Address {
    "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap()
}

pub fn bob() -> Address {
    "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap()
}

/// How the scripted wallet answers `eth_sendTransaction`.
#[derive(Clone, Copy)]
pub enum Approval {
    Accept,
    Reject,
    /// Never answer, like an ignored wallet prompt.
    Hang,
}

/// Wallet that answers from a script and records every request.
pub struct ScriptedWallet {
    accounts: Vec<Address>,
    approval: Mutex<Approval>,
    requests: Mutex<Vec<WalletRequest>>,
}

impl ScriptedWallet {
    pub fn new(accounts: Vec<Address>, approval: Approval) -> Self {
        Self {
            accounts,
            approval: Mutex::new(approval),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Change how later transfers are answered.
    pub fn set_approval(&self, approval: Approval) {
        *self.approval.lock().unwrap() = approval;
    }

    pub fn requests(&self) -> Vec<WalletRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn send_requests(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| matches!(r, WalletRequest::SendTransaction(_)))
            .count()
    }
}

#[async_trait]
impl WalletProvider for ScriptedWallet {
    async fn request(&self, request: &WalletRequest) -> WalletResult<Value> {
        self.requests.lock().unwrap().push(request.clone());
        match request {
            WalletRequest::Accounts | WalletRequest::RequestAccounts => {
                let accounts: Vec<String> = self.accounts.iter().map(|a| a.to_string()).collect();
                Ok(json!(accounts))
            }
            WalletRequest::SendTransaction(_) => {
                let approval = *self.approval.lock().unwrap();
                match approval {
                    Approval::Accept => Ok(json!(TxHash::repeat_byte(0x42).to_string())),
                    Approval::Reject => Err(WalletError::UserRejected),
                    Approval::Hang => std::future::pending().await,
                }
            }
        }
    }
}

/// In-memory stand-in for the `Transactions` contract.
pub struct ScriptedContract {
    records: Mutex<Vec<RawTransfer>>,
    /// Every call of any method.
    pub calls: AtomicUsize,
    pub count_queries: AtomicUsize,
    /// Extra offset so the counter can differ from the record list.
    pub count_offset: AtomicU64,
    /// When set, `confirm` waits for a notification.
    pub confirm_gate: Option<Arc<Notify>>,
    /// When set, `get_transaction_count` waits for a notification before
    /// reading the count.
    pub count_gate: Option<Arc<Notify>>,
    pub confirm_outcome: ConfirmationStatus,
    pub fail_reads: bool,
}

impl ScriptedContract {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            count_queries: AtomicUsize::new(0),
            count_offset: AtomicU64::new(0),
            confirm_gate: None,
            count_gate: None,
            confirm_outcome: ConfirmationStatus::Confirmed { block_number: 7 },
            fail_reads: false,
        }
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            confirm_gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn with_records(records: Vec<RawTransfer>) -> Self {
        let contract = Self::new();
        *contract.records.lock().unwrap() = records;
        contract
    }

    pub fn records(&self) -> Vec<RawTransfer> {
        self.records.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContractClient for ScriptedContract {
    async fn get_all_transactions(&self) -> BlockchainResult<Vec<RawTransfer>> {
        self.touch();
        if self.fail_reads {
            return Err(BlockchainError::Rpc("node unreachable".to_string()));
        }
        Ok(self.records())
    }

    async fn get_transaction_count(&self) -> BlockchainResult<u64> {
        self.touch();
        self.count_queries.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.count_gate {
            gate.notified().await;
        }
        if self.fail_reads {
            return Err(BlockchainError::Rpc("node unreachable".to_string()));
        }
        Ok(self.records.lock().unwrap().len() as u64 + self.count_offset.load(Ordering::SeqCst))
    }

    async fn add_to_blockchain(
        &self,
        from: Address,
        to: Address,
        amount: U256,
        message: &str,
        keyword: &str,
    ) -> BlockchainResult<PendingTransfer> {
        self.touch();
        self.records.lock().unwrap().push(RawTransfer {
            sender: from,
            receiver: to,
            amount,
            message: message.to_string(),
            timestamp: U256::from(1_700_000_000u64),
            keyword: keyword.to_string(),
        });
        Ok(PendingTransfer {
            tx_hash: TxHash::repeat_byte(0x77),
        })
    }

    async fn confirm(&self, _pending: &PendingTransfer) -> BlockchainResult<ConfirmationStatus> {
        self.touch();
        if let Some(gate) = &self.confirm_gate {
            gate.notified().await;
        }
        Ok(self.confirm_outcome.clone())
    }
}
