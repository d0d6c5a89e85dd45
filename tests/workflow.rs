//! End-to-end behaviour of the submission workflow against scripted doubles.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::U256;
use tokio::sync::Notify;

use transfer_dapp::blockchain::{ConfirmationStatus, RawTransfer, WalletProvider, WalletRequest};
use transfer_dapp::lifecycle::Shutdown;
use transfer_dapp::storage::{KeyValueStore, MemoryStore, TRANSACTION_COUNT_KEY};
use transfer_dapp::workflow::{
    FormField, FormInput, SubmissionPhase, TransactionWorkflow, WorkflowError,
};

mod common;
use common::{alice, bob, Approval, ScriptedContract, ScriptedWallet};

fn form() -> FormInput {
    FormInput {
        address_to: bob().to_string(),
        amount: "0.01".to_string(),
        keyword: "coffee".to_string(),
        message: "thanks for the coffee".to_string(),
    }
}

fn workflow(
    wallet: Option<Arc<ScriptedWallet>>,
    contract: Arc<ScriptedContract>,
    store: Arc<MemoryStore>,
) -> TransactionWorkflow {
    let wallet = wallet.map(|w| w as Arc<dyn WalletProvider>);
    TransactionWorkflow::new(wallet, contract, store)
}

#[tokio::test]
async fn test_submit_without_wallet_touches_nothing() {
    let contract = Arc::new(ScriptedContract::new());
    let workflow = workflow(None, contract.clone(), Arc::new(MemoryStore::new()));
    workflow.set_form(form());

    let err = workflow.submit().await.unwrap_err();
    assert!(matches!(err, WorkflowError::EnvironmentMissing));
    assert_eq!(contract.calls(), 0);

    let state = workflow.snapshot();
    assert!(!state.loading());
    assert_eq!(state.phase, SubmissionPhase::Idle);
    assert_eq!(state.form, form());
}

#[tokio::test]
async fn test_connect_without_wallet() {
    let workflow = workflow(
        None,
        Arc::new(ScriptedContract::new()),
        Arc::new(MemoryStore::new()),
    );
    assert!(matches!(
        workflow.connect_wallet().await,
        Err(WorkflowError::EnvironmentMissing)
    ));
    assert!(matches!(
        workflow.check_wallet_connection().await,
        Err(WorkflowError::EnvironmentMissing)
    ));
}

#[tokio::test]
async fn test_connect_uses_first_account() {
    let wallet = Arc::new(ScriptedWallet::new(vec![alice(), bob()], Approval::Accept));
    let workflow = workflow(
        Some(wallet.clone()),
        Arc::new(ScriptedContract::new()),
        Arc::new(MemoryStore::new()),
    );

    assert_eq!(workflow.connect_wallet().await.unwrap(), alice());
    assert_eq!(workflow.snapshot().current_account, Some(alice()));
    assert_eq!(wallet.requests(), vec![WalletRequest::RequestAccounts]);
}

#[tokio::test]
async fn test_connect_with_no_accounts() {
    let wallet = Arc::new(ScriptedWallet::new(Vec::new(), Approval::Accept));
    let workflow = workflow(
        Some(wallet),
        Arc::new(ScriptedContract::new()),
        Arc::new(MemoryStore::new()),
    );
    assert!(matches!(
        workflow.connect_wallet().await,
        Err(WorkflowError::NoAccount)
    ));
    assert!(!workflow.snapshot().is_connected());
}

#[tokio::test]
async fn test_check_connection_without_authorized_account() {
    let wallet = Arc::new(ScriptedWallet::new(Vec::new(), Approval::Accept));
    let contract = Arc::new(ScriptedContract::new());
    let workflow = workflow(Some(wallet.clone()), contract.clone(), Arc::new(MemoryStore::new()));

    assert_eq!(workflow.check_wallet_connection().await.unwrap(), None);
    assert!(!workflow.snapshot().is_connected());
    assert_eq!(wallet.requests(), vec![WalletRequest::Accounts]);
    assert_eq!(contract.calls(), 0);
}

#[tokio::test]
async fn test_check_connection_loads_history() {
    let record = RawTransfer {
        sender: alice(),
        receiver: bob(),
        amount: U256::from(1_000_000_000_000_000_000u64),
        message: "hi".to_string(),
        timestamp: U256::from(1_700_000_000u64),
        keyword: "wave".to_string(),
    };
    let wallet = Arc::new(ScriptedWallet::new(vec![alice()], Approval::Accept));
    let contract = Arc::new(ScriptedContract::with_records(vec![record]));
    let workflow = workflow(Some(wallet), contract, Arc::new(MemoryStore::new()));

    assert_eq!(workflow.check_wallet_connection().await.unwrap(), Some(alice()));

    let state = workflow.snapshot();
    assert_eq!(state.current_account, Some(alice()));
    assert_eq!(state.transactions.len(), 1);
    assert_eq!(state.transactions[0].amount, "1");
    assert_eq!(state.transactions[0].timestamp.timestamp(), 1_700_000_000);
}

#[tokio::test]
async fn test_fetch_empty_history() {
    let workflow = workflow(
        None,
        Arc::new(ScriptedContract::new()),
        Arc::new(MemoryStore::new()),
    );
    assert!(workflow.fetch_all_transactions().await.unwrap().is_empty());
    assert!(workflow.snapshot().transactions.is_empty());
}

#[tokio::test]
async fn test_counter_read_from_store_at_startup() {
    let store = Arc::new(MemoryStore::new());
    store.set(TRANSACTION_COUNT_KEY, "5").unwrap();
    let workflow = workflow(None, Arc::new(ScriptedContract::new()), store);
    assert_eq!(workflow.snapshot().transaction_count, Some(5));
}

#[tokio::test]
async fn test_refresh_persists_contract_count() {
    let store = Arc::new(MemoryStore::new());
    let contract = Arc::new(ScriptedContract::new());
    contract.count_offset.store(9, Ordering::SeqCst);
    let workflow = workflow(None, contract, store.clone());

    assert_eq!(workflow.refresh_transaction_count().await.unwrap(), 9);
    assert_eq!(workflow.snapshot().transaction_count, Some(9));
    assert_eq!(store.get(TRANSACTION_COUNT_KEY).as_deref(), Some("9"));
}

#[tokio::test]
async fn test_successful_submit() {
    let wallet = Arc::new(ScriptedWallet::new(vec![alice()], Approval::Accept));
    let contract = Arc::new(ScriptedContract::new());
    let store = Arc::new(MemoryStore::new());
    let workflow = workflow(Some(wallet.clone()), contract.clone(), store.clone());

    workflow.connect_wallet().await.unwrap();
    workflow.update_field(FormField::AddressTo, bob().to_string());
    workflow.update_field(FormField::Amount, "0.01");
    workflow.update_field(FormField::Keyword, "coffee");
    workflow.update_field(FormField::Message, "thanks");

    let receipt = workflow.submit().await.unwrap();
    assert_eq!(receipt.block_number, 7);
    assert_eq!(receipt.transaction_count, Some(1));

    let state = workflow.snapshot();
    assert!(state.form.is_empty());
    assert!(!state.loading());
    assert_eq!(state.transaction_count, Some(1));
    assert_eq!(state.transactions.len(), 1);
    assert_eq!(store.get(TRANSACTION_COUNT_KEY).as_deref(), Some("1"));

    let recorded = contract.records();
    assert_eq!(recorded[0].sender, alice());
    assert_eq!(recorded[0].receiver, bob());
    assert_eq!(recorded[0].amount, U256::from(10_000_000_000_000_000u64));
    assert_eq!(recorded[0].keyword, "coffee");

    let send = wallet
        .requests()
        .into_iter()
        .find(|r| matches!(r, WalletRequest::SendTransaction(_)))
        .unwrap();
    let params = send.params();
    assert_eq!(params[0]["gas"], "0x5208");
    assert_eq!(params[0]["value"], "0x2386f26fc10000");
}

#[tokio::test]
async fn test_submit_requires_connected_account() {
    let wallet = Arc::new(ScriptedWallet::new(vec![alice()], Approval::Accept));
    let contract = Arc::new(ScriptedContract::new());
    let workflow = workflow(Some(wallet.clone()), contract.clone(), Arc::new(MemoryStore::new()));
    workflow.set_form(form());

    assert!(matches!(workflow.submit().await, Err(WorkflowError::NoAccount)));
    assert_eq!(wallet.send_requests(), 0);
    assert_eq!(contract.calls(), 0);
}

#[tokio::test]
async fn test_invalid_amount_is_refused_before_wallet() {
    let wallet = Arc::new(ScriptedWallet::new(vec![alice()], Approval::Accept));
    let workflow = workflow(
        Some(wallet.clone()),
        Arc::new(ScriptedContract::new()),
        Arc::new(MemoryStore::new()),
    );
    workflow.connect_wallet().await.unwrap();
    workflow.set_form(FormInput {
        amount: "ten".to_string(),
        ..form()
    });

    assert!(matches!(
        workflow.submit().await,
        Err(WorkflowError::InvalidAmount(_))
    ));
    assert_eq!(wallet.send_requests(), 0);
    assert_eq!(workflow.snapshot().phase, SubmissionPhase::Idle);
}

#[tokio::test]
async fn test_rejection_keeps_form_and_clears_state() {
    let wallet = Arc::new(ScriptedWallet::new(vec![alice()], Approval::Reject));
    let contract = Arc::new(ScriptedContract::new());
    let workflow = workflow(Some(wallet), contract.clone(), Arc::new(MemoryStore::new()));
    workflow.connect_wallet().await.unwrap();
    workflow.set_form(form());

    let err = workflow.submit().await.unwrap_err();
    assert!(err.is_user_rejection());
    assert_eq!(contract.calls(), 0);

    let state = workflow.snapshot();
    assert_eq!(state.form, form());
    assert_eq!(state.phase, SubmissionPhase::Idle);
    assert!(!state.loading());
}

#[tokio::test]
async fn test_reverted_record_resets_loading() {
    let wallet = Arc::new(ScriptedWallet::new(vec![alice()], Approval::Accept));
    let mut contract = ScriptedContract::new();
    contract.confirm_outcome = ConfirmationStatus::Failed("Transaction reverted".to_string());
    let contract = Arc::new(contract);
    let store = Arc::new(MemoryStore::new());
    let workflow = workflow(Some(wallet), contract, store.clone());
    workflow.connect_wallet().await.unwrap();
    workflow.set_form(form());

    assert!(matches!(
        workflow.submit().await,
        Err(WorkflowError::Reverted { .. })
    ));

    let state = workflow.snapshot();
    assert!(!state.loading());
    assert_eq!(state.form, form());
    assert!(store.get(TRANSACTION_COUNT_KEY).is_none());
}

#[tokio::test]
async fn test_refresh_failure_does_not_fail_confirmed_submit() {
    let wallet = Arc::new(ScriptedWallet::new(vec![alice()], Approval::Accept));
    let mut contract = ScriptedContract::new();
    contract.fail_reads = true;
    let workflow = workflow(Some(wallet), Arc::new(contract), Arc::new(MemoryStore::new()));
    workflow.connect_wallet().await.unwrap();
    workflow.set_form(form());

    let receipt = workflow.submit().await.unwrap();
    assert_eq!(receipt.transaction_count, None);
    assert!(workflow.snapshot().form.is_empty());
}

#[tokio::test]
async fn test_second_submit_rejected_while_pending() {
    let gate = Arc::new(Notify::new());
    let wallet = Arc::new(ScriptedWallet::new(vec![alice()], Approval::Accept));
    let contract = Arc::new(ScriptedContract::gated(gate.clone()));
    let workflow = Arc::new(workflow(
        Some(wallet.clone()),
        contract.clone(),
        Arc::new(MemoryStore::new()),
    ));
    workflow.connect_wallet().await.unwrap();
    workflow.set_form(form());

    let mut updates = workflow.subscribe();
    let first = tokio::spawn({
        let workflow = workflow.clone();
        async move { workflow.submit().await }
    });
    updates.wait_for(|s| s.loading()).await.unwrap();

    assert!(matches!(
        workflow.submit().await,
        Err(WorkflowError::SubmissionInProgress)
    ));
    assert!(workflow.snapshot().loading());
    assert_eq!(wallet.send_requests(), 1);

    gate.notify_one();
    let receipt = first.await.unwrap().unwrap();
    assert_eq!(receipt.transaction_count, Some(1));
    assert_eq!(contract.count_queries.load(Ordering::SeqCst), 1);
    assert!(!workflow.snapshot().loading());
}

#[tokio::test]
async fn test_cancel_while_awaiting_approval() {
    let wallet = Arc::new(ScriptedWallet::new(vec![alice()], Approval::Hang));
    let contract = Arc::new(ScriptedContract::new());
    let workflow = Arc::new(workflow(Some(wallet), contract.clone(), Arc::new(MemoryStore::new())));
    workflow.connect_wallet().await.unwrap();
    workflow.set_form(form());
    assert!(!workflow.cancel_submission());

    let mut updates = workflow.subscribe();
    let task = tokio::spawn({
        let workflow = workflow.clone();
        async move { workflow.submit().await }
    });
    updates
        .wait_for(|s| s.phase == SubmissionPhase::AwaitingWalletApproval)
        .await
        .unwrap();

    assert!(workflow.cancel_submission());
    assert!(matches!(task.await.unwrap(), Err(WorkflowError::Cancelled)));
    assert_eq!(workflow.snapshot().phase, SubmissionPhase::Idle);
    assert_eq!(workflow.snapshot().form, form());
    assert_eq!(contract.calls(), 0);
}

#[tokio::test]
async fn test_cancel_while_confirming() {
    let gate = Arc::new(Notify::new());
    let wallet = Arc::new(ScriptedWallet::new(vec![alice()], Approval::Accept));
    let workflow = Arc::new(workflow(
        Some(wallet),
        Arc::new(ScriptedContract::gated(gate)),
        Arc::new(MemoryStore::new()),
    ));
    workflow.connect_wallet().await.unwrap();
    workflow.set_form(form());

    let mut updates = workflow.subscribe();
    let task = tokio::spawn({
        let workflow = workflow.clone();
        async move { workflow.submit().await }
    });
    updates.wait_for(|s| s.loading()).await.unwrap();

    assert!(workflow.cancel_submission());
    assert!(matches!(task.await.unwrap(), Err(WorkflowError::Cancelled)));
    assert!(!workflow.snapshot().loading());
}

#[tokio::test]
async fn test_sync_task_refreshes_until_shutdown() {
    let wallet = Arc::new(ScriptedWallet::new(vec![alice()], Approval::Accept));
    let contract = Arc::new(ScriptedContract::new());
    contract.count_offset.store(3, Ordering::SeqCst);
    let store = Arc::new(MemoryStore::new());
    let workflow = Arc::new(workflow(Some(wallet), contract, store.clone()));

    let shutdown = Shutdown::new();
    let mut updates = workflow.subscribe();
    let handle = workflow
        .clone()
        .spawn_sync_task(Duration::from_millis(10), &shutdown);

    updates
        .wait_for(|s| s.transaction_count == Some(3) && s.is_connected())
        .await
        .unwrap();
    shutdown.trigger();
    handle.await.unwrap();

    assert_eq!(store.get(TRANSACTION_COUNT_KEY).as_deref(), Some("3"));
}

async fn wait_for_count_queries(contract: &ScriptedContract, n: usize) {
    while contract.count_queries.load(Ordering::SeqCst) < n {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_next_submission_cancellable_while_previous_finishes() {
    let count_gate = Arc::new(Notify::new());
    let wallet = Arc::new(ScriptedWallet::new(vec![alice()], Approval::Accept));
    let mut contract = ScriptedContract::new();
    contract.count_gate = Some(count_gate.clone());
    let workflow = Arc::new(workflow(
        Some(wallet.clone()),
        Arc::new(contract),
        Arc::new(MemoryStore::new()),
    ));
    workflow.connect_wallet().await.unwrap();
    workflow.set_form(form());

    let mut updates = workflow.subscribe();
    let first = tokio::spawn({
        let workflow = workflow.clone();
        async move { workflow.submit().await }
    });
    // Confirmed and back to Idle, counter refresh still held at the gate.
    updates.wait_for(|s| s.form.is_empty()).await.unwrap();

    wallet.set_approval(Approval::Hang);
    workflow.set_form(form());
    let second = tokio::spawn({
        let workflow = workflow.clone();
        async move { workflow.submit().await }
    });
    updates
        .wait_for(|s| s.phase == SubmissionPhase::AwaitingWalletApproval)
        .await
        .unwrap();

    count_gate.notify_one();
    assert_eq!(first.await.unwrap().unwrap().transaction_count, Some(1));

    assert!(workflow.cancel_submission());
    assert!(matches!(second.await.unwrap(), Err(WorkflowError::Cancelled)));
    assert_eq!(workflow.snapshot().phase, SubmissionPhase::Idle);
    assert_eq!(workflow.snapshot().form, form());
}

#[tokio::test]
async fn test_concurrent_refreshes_persist_in_query_order() {
    let count_gate = Arc::new(Notify::new());
    let wallet = Arc::new(ScriptedWallet::new(vec![alice()], Approval::Accept));
    let mut contract = ScriptedContract::new();
    contract.count_gate = Some(count_gate.clone());
    let contract = Arc::new(contract);
    let store = Arc::new(MemoryStore::new());
    let workflow = Arc::new(workflow(Some(wallet), contract.clone(), store.clone()));
    workflow.connect_wallet().await.unwrap();
    workflow.set_form(form());

    let submission = tokio::spawn({
        let workflow = workflow.clone();
        async move { workflow.submit().await }
    });
    wait_for_count_queries(&contract, 1).await;

    let sync = tokio::spawn({
        let workflow = workflow.clone();
        async move { workflow.sync().await }
    });
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    // The sync waits on the counter lock instead of querying alongside.
    assert_eq!(contract.count_queries.load(Ordering::SeqCst), 1);

    count_gate.notify_one();
    wait_for_count_queries(&contract, 2).await;
    contract.count_offset.store(4, Ordering::SeqCst);
    count_gate.notify_one();

    assert_eq!(submission.await.unwrap().unwrap().transaction_count, Some(1));
    sync.await.unwrap().unwrap();

    assert_eq!(store.get(TRANSACTION_COUNT_KEY).as_deref(), Some("5"));
    assert_eq!(workflow.snapshot().transaction_count, Some(5));
}
