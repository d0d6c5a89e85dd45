//! Command-line front end for wallet-driven transfers.
//!
//! # Architecture Overview
//!
//! ```text
//!   CLI command ──▶ TransactionWorkflow ──▶ WalletProvider ──▶ node / local key
//!        ▲                 │          └───▶ ContractClient ──▶ Transactions contract
//!        │                 ▼
//!        └──── SessionState (watch) ◀── PersistedCounter ──▶ store file
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use transfer_dapp::blockchain::{
    BlockchainClient, LocalWallet, RpcWallet, TransactionsContract, WalletProvider,
};
use transfer_dapp::config::{load_or_default, AppConfig, WalletKind};
use transfer_dapp::lifecycle::{signals, Shutdown};
use transfer_dapp::observability::{logging, metrics};
use transfer_dapp::storage::FileStore;
use transfer_dapp::workflow::{FormInput, SessionState, SubmissionPhase, TransactionWorkflow};

#[derive(Parser)]
#[command(name = "transfer-dapp")]
#[command(about = "Send value transfers through a wallet and record them on chain", long_about = None)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Request account access from the wallet
    Connect,
    /// Show account, transfer count and submission state
    Status,
    /// List every recorded transfer
    History {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Send a transfer and record it on the contract
    Send {
        /// Recipient address
        #[arg(long)]
        to: String,
        /// Amount in whole units, e.g. 0.01
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "")]
        keyword: String,
        #[arg(long, default_value = "")]
        message: String,
    },
    /// Keep account and transfer count in sync until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;
    logging::init(&config.observability);

    tracing::info!(
        network = %config.network.active,
        contract = %config.contract.address,
        "transfer-dapp v0.1.0 starting"
    );

    let workflow = Arc::new(build_workflow(&config).await?);

    match cli.command {
        Commands::Connect => {
            let account = workflow.connect_wallet().await?;
            println!("Connected: {}", account);
        }
        Commands::Status => {
            if workflow.has_wallet() {
                workflow.check_wallet_connection().await?;
            }
            if let Err(e) = workflow.refresh_transaction_count().await {
                eprintln!("Could not refresh transaction count: {}", e);
            }
            print_status(&workflow.snapshot());
        }
        Commands::History { json } => {
            let transactions = workflow.fetch_all_transactions().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&transactions)?);
            } else if transactions.is_empty() {
                println!("No transactions recorded yet");
            } else {
                for tx in &transactions {
                    println!(
                        "{}  {} -> {}  {}  [{}] {}",
                        tx.display_timestamp(),
                        tx.address_from,
                        tx.address_to,
                        tx.amount,
                        tx.keyword,
                        tx.message
                    );
                }
            }
        }
        Commands::Send {
            to,
            amount,
            keyword,
            message,
        } => {
            send(
                workflow,
                FormInput {
                    address_to: to,
                    amount,
                    keyword,
                    message,
                },
            )
            .await?;
        }
        Commands::Watch => watch(workflow, &config).await?,
    }

    Ok(())
}

async fn build_workflow(config: &AppConfig) -> Result<TransactionWorkflow, Box<dyn std::error::Error>> {
    let network = config
        .active_network()
        .cloned()
        .ok_or_else(|| format!("network '{}' is not defined", config.network.active))?;

    let signer = match config.wallet.kind {
        WalletKind::Local => match LocalWallet::signer_from_env() {
            Ok(signer) => Some(signer),
            Err(e) => {
                tracing::warn!(error = %e, "Local wallet unavailable");
                None
            }
        },
        WalletKind::Rpc => None,
    };

    let client = BlockchainClient::new(network, signer.clone()).await?;
    let wallet: Option<Arc<dyn WalletProvider>> = match (config.wallet.kind, signer) {
        (WalletKind::Rpc, _) => Some(Arc::new(RpcWallet::new(client.clone())) as Arc<dyn WalletProvider>),
        (WalletKind::Local, Some(signer)) => {
            Some(Arc::new(LocalWallet::new(signer, client.clone())) as Arc<dyn WalletProvider>)
        }
        (WalletKind::Local, None) => None,
    };

    let contract = Arc::new(TransactionsContract::new(client, &config.contract.address)?);
    let store = Arc::new(FileStore::open(&config.storage.path)?);

    Ok(TransactionWorkflow::new(wallet, contract, store))
}

async fn send(workflow: Arc<TransactionWorkflow>, form: FormInput) -> Result<(), Box<dyn std::error::Error>> {
    if workflow.check_wallet_connection().await?.is_none() {
        workflow.connect_wallet().await?;
    }
    workflow.set_form(form);

    // Render phase changes while the submission runs.
    let mut updates = workflow.subscribe();
    let progress = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let phase = updates.borrow_and_update().phase;
            match phase {
                SubmissionPhase::AwaitingWalletApproval => println!("Waiting for wallet approval..."),
                SubmissionPhase::Pending { tx_hash } => println!("Loading: {}", tx_hash),
                SubmissionPhase::Idle => {}
            }
        }
    });

    let canceller = {
        let workflow = workflow.clone();
        tokio::spawn(async move {
            signals::shutdown_signal().await;
            workflow.cancel_submission();
        })
    };

    let result = workflow.submit().await;
    canceller.abort();
    progress.abort();

    match result {
        Ok(receipt) => {
            println!("Success: {}", receipt.tx_hash);
            println!("Transfer: {}", receipt.transfer_hash);
            println!("Block: {}", receipt.block_number);
            if let Some(count) = receipt.transaction_count {
                println!("Transactions recorded: {}", count);
            }
            Ok(())
        }
        Err(e) if e.is_user_rejection() => {
            eprintln!("Transfer rejected in wallet");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

async fn watch(workflow: Arc<TransactionWorkflow>, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?);
    }

    let shutdown = Shutdown::new();
    let signal_task = signals::install(shutdown.clone());
    let sync_task = workflow
        .clone()
        .spawn_sync_task(Duration::from_secs(config.sync.interval_secs), &shutdown);

    let mut updates = workflow.subscribe();
    let mut shutdown_rx = shutdown.subscribe();
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                print_status(&state);
            }
        }
    }

    sync_task.await?;
    signal_task.abort();
    tracing::info!("Shutdown complete");
    Ok(())
}

fn print_status(state: &SessionState) {
    match state.current_account {
        Some(account) => println!("Account: {}", account),
        None => println!("Account: not connected"),
    }
    match state.transaction_count {
        Some(count) => println!("Transactions recorded: {}", count),
        None => println!("Transactions recorded: unknown"),
    }
    println!("Loading: {}", state.loading());
}
