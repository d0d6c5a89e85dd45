//! The transaction-submission workflow.
//!
//! # State Transitions
//! ```text
//! Idle → AwaitingWalletApproval → Pending(loading) → Idle (confirmed)
//!   ↑              │                    │
//!   └──── error / cancel ───────────────┘
//! ```
//!
//! # Design Decisions
//! - Admission to `AwaitingWalletApproval` is a single check-and-set on the
//!   state channel; a second `submit` while one runs is rejected
//! - Every failure returns the phase to `Idle`, so `loading` never sticks
//! - The form is only cleared once the recording transaction confirmed
//! - Counter refreshes are serialised so writes land in query order
//! - The cancellation slot is owned by a submission id; a finishing
//!   submission never clears a successor's token

use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::Address;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::blockchain::contract::ContractClient;
use crate::blockchain::types::ConfirmationStatus;
use crate::blockchain::wallet::{self, TransferRequest, WalletProvider};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::storage::{KeyValueStore, PersistedCounter};
use crate::workflow::history::{map_transfers, Transaction};
use crate::workflow::types::{
    FormField, FormInput, SessionState, SubmissionPhase, Submission, SubmitReceipt,
    WorkflowError, WorkflowResult,
};

/// Orchestrates the wallet and the contract on behalf of a UI.
pub struct TransactionWorkflow {
    /// `None` models an environment without any wallet.
    wallet: Option<Arc<dyn WalletProvider>>,
    contract: Arc<dyn ContractClient>,
    counter: tokio::sync::Mutex<PersistedCounter>,
    state: watch::Sender<SessionState>,
    /// Cancellation handle of the submission in flight, keyed by its id.
    active: Mutex<Option<(Uuid, CancellationToken)>>,
}

impl TransactionWorkflow {
    /// Create a workflow. The persisted counter is read here, once.
    pub fn new(
        wallet: Option<Arc<dyn WalletProvider>>,
        contract: Arc<dyn ContractClient>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let counter = PersistedCounter::load(store);
        let initial = SessionState {
            transaction_count: counter.value(),
            ..SessionState::default()
        };
        let (state, _) = watch::channel(initial);

        Self {
            wallet,
            contract,
            counter: tokio::sync::Mutex::new(counter),
            state,
            active: Mutex::new(None),
        }
    }

    /// Current state.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Whether a wallet provider is available at all.
    pub fn has_wallet(&self) -> bool {
        self.wallet.is_some()
    }

    /// Edit one form field.
    pub fn update_field(&self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        self.state.send_modify(|s| s.form.set(field, value));
    }

    /// Replace the whole form.
    pub fn set_form(&self, form: FormInput) {
        self.state.send_modify(|s| s.form = form);
    }

    /// Prompt the wallet for account access.
    pub async fn connect_wallet(&self) -> WorkflowResult<Address> {
        let wallet = self.wallet()?;
        let account = wallet::request_accounts(wallet.as_ref())
            .await
            .map_err(WorkflowError::from)
            .and_then(|accounts| accounts.first().copied().ok_or(WorkflowError::NoAccount))
            .inspect_err(|e| tracing::warn!(error = %e, "Wallet connection failed"))?;

        self.state.send_modify(|s| s.current_account = Some(account));
        tracing::info!(account = %account, "Wallet connected");
        Ok(account)
    }

    /// Adopt an already-authorized account without prompting.
    ///
    /// When one exists the history is refreshed too. `Ok(None)` means the
    /// wallet has not authorized any account yet.
    pub async fn check_wallet_connection(&self) -> WorkflowResult<Option<Address>> {
        let wallet = self.wallet()?;
        let accounts = wallet::accounts(wallet.as_ref())
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Account query failed"))?;

        let Some(account) = accounts.first().copied() else {
            tracing::info!("No account found");
            return Ok(None);
        };

        self.state.send_modify(|s| s.current_account = Some(account));
        tracing::debug!(account = %account, "Found authorized account");
        self.fetch_all_transactions().await?;
        Ok(Some(account))
    }

    /// Query the contract counter and persist it.
    pub async fn refresh_transaction_count(&self) -> WorkflowResult<u64> {
        // Held across query and write so concurrent refreshes persist in order.
        let mut counter = self.counter.lock().await;

        let count = self
            .contract
            .get_transaction_count()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Transaction count query failed"))?;
        counter
            .store(count)
            .inspect_err(|e| tracing::error!(error = %e, "Failed to persist transaction count"))?;

        self.state.send_modify(|s| s.transaction_count = Some(count));
        metrics::record_transaction_count(count);
        tracing::debug!(count, "Transaction count refreshed");
        Ok(count)
    }

    /// Replace the local history with the contract's full list.
    pub async fn fetch_all_transactions(&self) -> WorkflowResult<Vec<Transaction>> {
        let raw = self
            .contract
            .get_all_transactions()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "History query failed"))?;
        let transactions = map_transfers(raw)?;

        metrics::record_history_size(transactions.len());
        tracing::debug!(records = transactions.len(), "History refreshed");
        self.state
            .send_modify(|s| s.transactions = transactions.clone());
        Ok(transactions)
    }

    /// Account check followed by a counter refresh.
    pub async fn sync(&self) -> WorkflowResult<()> {
        if self.wallet.is_some() {
            self.check_wallet_connection().await?;
        }
        self.refresh_transaction_count().await?;
        Ok(())
    }

    /// Run `sync` every `period` until shutdown.
    pub fn spawn_sync_task(self: Arc<Self>, period: Duration, shutdown: &Shutdown) -> JoinHandle<()> {
        let mut shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Sync task stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = self.sync().await {
                            tracing::warn!(error = %e, "Periodic sync failed");
                        }
                    }
                }
            }
        })
    }

    /// Cancel the submission in flight, if any.
    ///
    /// Cancelling while the wallet prompt is open only stops waiting; the
    /// wallet may still act on its prompt. Cancelling during confirmation
    /// stops waiting; the recorded transaction may still be mined.
    pub fn cancel_submission(&self) -> bool {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        match active.as_ref() {
            Some((_, token)) => {
                token.cancel();
                tracing::info!("Submission cancellation requested");
                true
            }
            None => false,
        }
    }

    /// Send the current form: value transfer, record, confirm, refresh.
    pub async fn submit(&self) -> WorkflowResult<SubmitReceipt> {
        let Some(wallet) = self.wallet.clone() else {
            tracing::warn!("Submission attempted without a wallet");
            metrics::record_submission(WorkflowError::EnvironmentMissing.outcome());
            return Err(WorkflowError::EnvironmentMissing);
        };

        let mut admission = Err(WorkflowError::SubmissionInProgress);
        self.state.send_if_modified(|s| {
            if s.phase != SubmissionPhase::Idle {
                return false;
            }
            match Submission::prepare(&s.form, s.current_account) {
                Ok(submission) => {
                    s.phase = SubmissionPhase::AwaitingWalletApproval;
                    admission = Ok(submission);
                    true
                }
                Err(e) => {
                    admission = Err(e);
                    false
                }
            }
        });
        let submission = match admission {
            Ok(submission) => submission,
            Err(e) => {
                tracing::warn!(error = %e, "Submission refused");
                metrics::record_submission(e.outcome());
                return Err(e);
            }
        };

        let submission_id = Uuid::new_v4();
        let token = CancellationToken::new();
        self.set_active(submission_id, token.clone());

        let span = tracing::info_span!("submit", submission_id = %submission_id);
        let result = self
            .drive(wallet, submission, submission_id, &token)
            .instrument(span)
            .await;

        self.clear_active(submission_id);
        match &result {
            Ok(receipt) => {
                metrics::record_submission("confirmed");
                tracing::info!(
                    submission_id = %submission_id,
                    tx_hash = %receipt.tx_hash,
                    block_number = receipt.block_number,
                    "Submission confirmed"
                );
            }
            Err(e) => {
                self.state.send_modify(|s| s.phase = SubmissionPhase::Idle);
                metrics::record_pending(false);
                metrics::record_submission(e.outcome());
                tracing::warn!(submission_id = %submission_id, error = %e, "Submission failed");
            }
        }
        result
    }

    async fn drive(
        &self,
        wallet: Arc<dyn WalletProvider>,
        submission: Submission,
        submission_id: Uuid,
        token: &CancellationToken,
    ) -> WorkflowResult<SubmitReceipt> {
        let transfer = TransferRequest {
            from: submission.from,
            to: submission.to,
            value: submission.amount,
        };
        tracing::info!(from = %transfer.from, to = %transfer.to, value = %transfer.value, "Requesting wallet approval");

        let transfer_hash = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(WorkflowError::Cancelled),
            sent = wallet::send_transfer(wallet.as_ref(), transfer) => sent?,
        };
        tracing::info!(transfer_hash = %transfer_hash, "Wallet accepted transfer");

        let pending = self
            .contract
            .add_to_blockchain(
                submission.from,
                submission.to,
                submission.amount,
                &submission.message,
                &submission.keyword,
            )
            .await?;

        self.state.send_modify(|s| {
            s.phase = SubmissionPhase::Pending {
                tx_hash: pending.tx_hash,
            }
        });
        metrics::record_pending(true);
        tracing::info!(tx_hash = %pending.tx_hash, "Loading");

        let status = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(WorkflowError::Cancelled),
            status = self.contract.confirm(&pending) => status?,
        };
        let block_number = match status {
            ConfirmationStatus::Confirmed { block_number } => block_number,
            ConfirmationStatus::Failed(reason) => {
                return Err(WorkflowError::Reverted {
                    tx_hash: pending.tx_hash,
                    reason,
                })
            }
        };

        self.state.send_modify(|s| {
            s.phase = SubmissionPhase::Idle;
            s.form = FormInput::default();
        });
        metrics::record_pending(false);
        tracing::info!(tx_hash = %pending.tx_hash, block_number, "Success");

        // The transfer is final from here on; refresh failures are reported
        // through the receipt, not as a failed submission.
        let transaction_count = self.refresh_transaction_count().await.ok();
        if let Err(e) = self.fetch_all_transactions().await {
            tracing::warn!(error = %e, "History refresh after submission failed");
        }

        Ok(SubmitReceipt {
            submission_id,
            transfer_hash,
            tx_hash: pending.tx_hash,
            block_number,
            transaction_count,
        })
    }

    fn wallet(&self) -> WorkflowResult<&Arc<dyn WalletProvider>> {
        self.wallet.as_ref().ok_or_else(|| {
            tracing::warn!("No wallet available");
            WorkflowError::EnvironmentMissing
        })
    }

    fn set_active(&self, submission_id: Uuid, token: CancellationToken) {
        *self.active.lock().unwrap_or_else(|e| e.into_inner()) = Some((submission_id, token));
    }

    /// Release the slot unless a later submission already took it over.
    ///
    /// The phase returns to `Idle` before the post-confirmation refresh, so a
    /// new submission may be admitted while this one is still finishing.
    fn clear_active(&self, submission_id: Uuid) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if active.as_ref().is_some_and(|(id, _)| *id == submission_id) {
            *active = None;
        }
    }
}

impl std::fmt::Debug for TransactionWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionWorkflow")
            .field("has_wallet", &self.wallet.is_some())
            .field("state", &*self.state.borrow())
            .finish()
    }
}
