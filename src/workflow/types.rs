//! Session state, form input and typed outcomes of the workflow.

use alloy::primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::blockchain::types::{BlockchainError, WalletError};
use crate::blockchain::units::{parse_amount, AmountError};
use crate::storage::StorageError;
use crate::workflow::history::Transaction;

/// Fields of the transfer form, as edited by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInput {
    pub address_to: String,
    /// Decimal amount in whole units (e.g. `"0.01"`).
    pub amount: String,
    pub keyword: String,
    pub message: String,
}

impl FormInput {
    /// True when every field is blank.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite one field.
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::AddressTo => self.address_to = value,
            FormField::Amount => self.amount = value,
            FormField::Keyword => self.keyword = value,
            FormField::Message => self.message = value,
        }
    }
}

/// Names of the editable form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    AddressTo,
    Amount,
    Keyword,
    Message,
}

/// Where the single allowed submission currently stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    /// Waiting for the user to approve the transfer in the wallet.
    AwaitingWalletApproval,
    /// Recorded on the contract, waiting for confirmation.
    Pending { tx_hash: TxHash },
}

/// Everything the presentation layer may read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub form: FormInput,
    /// `None` while disconnected.
    pub current_account: Option<Address>,
    /// Last fetched history, replaced wholesale.
    pub transactions: Vec<Transaction>,
    /// Last known contract counter, `None` if never fetched or persisted.
    pub transaction_count: Option<u64>,
    pub phase: SubmissionPhase,
}

impl SessionState {
    /// True only while a recorded transfer is unconfirmed.
    pub fn loading(&self) -> bool {
        matches!(self.phase, SubmissionPhase::Pending { .. })
    }

    pub fn is_connected(&self) -> bool {
        self.current_account.is_some()
    }
}

/// Validated inputs of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Submission {
    pub from: Address,
    pub to: Address,
    pub amount: U256,
    pub message: String,
    pub keyword: String,
}

impl Submission {
    pub(crate) fn prepare(
        form: &FormInput,
        account: Option<Address>,
    ) -> Result<Self, WorkflowError> {
        let from = account.ok_or(WorkflowError::NoAccount)?;
        let amount = parse_amount(&form.amount)?;
        let to = form
            .address_to
            .trim()
            .parse::<Address>()
            .map_err(|_| WorkflowError::InvalidAddress(form.address_to.clone()))?;
        Ok(Self {
            from,
            to,
            amount,
            message: form.message.clone(),
            keyword: form.keyword.clone(),
        })
    }
}

/// Result of a confirmed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub submission_id: Uuid,
    /// Hash of the native value transfer approved in the wallet.
    pub transfer_hash: TxHash,
    /// Hash of the `addToBlockchain` call.
    pub tx_hash: TxHash,
    pub block_number: u64,
    /// Counter after confirmation; `None` if the refresh failed.
    pub transaction_count: Option<u64>,
}

/// Errors returned by workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No wallet provider is available.
    #[error("no wallet detected; install or configure a wallet")]
    EnvironmentMissing,

    #[error("no wallet account is connected")]
    NoAccount,

    #[error("a submission is already in progress")]
    SubmissionInProgress,

    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("invalid recipient address '{0}'")]
    InvalidAddress(String),

    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("contract call failed: {0}")]
    Contract(#[from] BlockchainError),

    #[error("transaction {tx_hash} failed: {reason}")]
    Reverted { tx_hash: TxHash, reason: String },

    #[error("submission cancelled")]
    Cancelled,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl WorkflowError {
    /// True when the user declined in the wallet.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, WorkflowError::Wallet(WalletError::UserRejected))
    }

    /// Metrics label.
    pub fn outcome(&self) -> &'static str {
        match self {
            WorkflowError::EnvironmentMissing => "environment_missing",
            WorkflowError::NoAccount => "no_account",
            WorkflowError::SubmissionInProgress => "in_progress",
            WorkflowError::InvalidAmount(_) | WorkflowError::InvalidAddress(_) => "invalid_input",
            WorkflowError::Wallet(WalletError::UserRejected) => "user_rejected",
            WorkflowError::Wallet(_) => "wallet_error",
            WorkflowError::Contract(_) => "contract_error",
            WorkflowError::Reverted { .. } => "reverted",
            WorkflowError::Cancelled => "cancelled",
            WorkflowError::Storage(_) => "storage_error",
        }
    }
}

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
