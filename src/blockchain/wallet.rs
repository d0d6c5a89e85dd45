//! Wallet providers and the request protocol spoken to them.
//!
//! # Responsibilities
//! - Model the three wallet methods the client needs as typed requests
//! - Decode wallet answers into addresses and hashes
//! - Provide a node-backed wallet and a local private-key wallet
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use alloy::primitives::{Address, TxHash, U256};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::transaction::build_transfer;
use crate::blockchain::types::{WalletError, WalletResult, TRANSFER_GAS_LIMIT};
use crate::blockchain::units::to_hex_quantity;

/// Environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "TRANSFER_WALLET_PRIVATE_KEY";

/// EIP-1193 error code for an account the wallet does not control.
const UNAUTHORIZED_CODE: i64 = 4100;

/// Native value transfer as handed to `eth_sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub from: Address,
    pub to: Address,
    /// Smallest-unit amount.
    pub value: U256,
}

impl TransferRequest {
    /// JSON-RPC transaction object (`{from, to, gas, value}`).
    pub fn to_json(&self) -> Value {
        json!({
            "from": self.from.to_string(),
            "to": self.to.to_string(),
            "gas": to_hex_quantity(U256::from(TRANSFER_GAS_LIMIT)),
            "value": to_hex_quantity(self.value),
        })
    }
}

/// Requests the client issues to a wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletRequest {
    /// Accounts already authorized, without prompting.
    Accounts,
    /// Prompt the user to authorize accounts.
    RequestAccounts,
    /// Ask the user to approve and submit a transfer.
    SendTransaction(TransferRequest),
}

impl WalletRequest {
    /// JSON-RPC method name.
    pub fn method(&self) -> &'static str {
        match self {
            WalletRequest::Accounts => "eth_accounts",
            WalletRequest::RequestAccounts => "eth_requestAccounts",
            WalletRequest::SendTransaction(_) => "eth_sendTransaction",
        }
    }

    /// JSON-RPC positional params.
    pub fn params(&self) -> Value {
        match self {
            WalletRequest::Accounts | WalletRequest::RequestAccounts => json!([]),
            WalletRequest::SendTransaction(tx) => json!([tx.to_json()]),
        }
    }
}

/// A wallet reachable through `request({method, params})`.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Issue a request and return the raw JSON result.
    async fn request(&self, request: &WalletRequest) -> WalletResult<Value>;
}

/// Ask for already-authorized accounts.
pub async fn accounts(wallet: &dyn WalletProvider) -> WalletResult<Vec<Address>> {
    decode_accounts(wallet.request(&WalletRequest::Accounts).await?)
}

/// Prompt for account access.
pub async fn request_accounts(wallet: &dyn WalletProvider) -> WalletResult<Vec<Address>> {
    decode_accounts(wallet.request(&WalletRequest::RequestAccounts).await?)
}

/// Submit a native transfer and return its hash once the wallet accepted it.
pub async fn send_transfer(
    wallet: &dyn WalletProvider,
    transfer: TransferRequest,
) -> WalletResult<TxHash> {
    let value = wallet
        .request(&WalletRequest::SendTransaction(transfer))
        .await?;
    value
        .as_str()
        .ok_or_else(|| WalletError::MalformedResponse(format!("expected hash, got {}", value)))?
        .parse()
        .map_err(|e| WalletError::MalformedResponse(format!("invalid transaction hash: {}", e)))
}

fn decode_accounts(value: Value) -> WalletResult<Vec<Address>> {
    let entries = value
        .as_array()
        .ok_or_else(|| WalletError::MalformedResponse(format!("expected array, got {}", value)))?;
    entries
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| WalletError::MalformedResponse(format!("invalid account {}", entry)))
        })
        .collect()
}

/// Wallet backed by accounts the RPC node manages (e.g. a local dev node).
#[derive(Debug, Clone)]
pub struct RpcWallet {
    client: BlockchainClient,
}

impl RpcWallet {
    pub fn new(client: BlockchainClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WalletProvider for RpcWallet {
    async fn request(&self, request: &WalletRequest) -> WalletResult<Value> {
        tracing::debug!(method = request.method(), "Forwarding wallet request to node");
        self.client
            .raw_request(request.method(), &request.params())
            .await
    }
}

/// Wallet holding a single private key and signing locally.
#[derive(Debug, Clone)]
pub struct LocalWallet {
    /// The underlying signer (private key).
    signer: PrivateKeySigner,
    /// Client whose provider signs with the same key.
    client: BlockchainClient,
}

impl LocalWallet {
    /// Parse a hex-encoded private key (with or without 0x prefix).
    ///
    /// # Security
    /// The private key is parsed and stored securely. It is never logged.
    pub fn signer_from_private_key(private_key_hex: &str) -> WalletResult<PrivateKeySigner> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
        key_hex
            .parse()
            .map_err(|e| WalletError::Key(format!("Invalid private key format: {}", e)))
    }

    /// Load the signer from `TRANSFER_WALLET_PRIVATE_KEY`.
    pub fn signer_from_env() -> WalletResult<PrivateKeySigner> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            WalletError::Key(format!("Environment variable {} not set", PRIVATE_KEY_ENV_VAR))
        })?;
        Self::signer_from_private_key(&private_key)
    }

    /// Create a wallet. `client` must have been built with the same signer.
    pub fn new(signer: PrivateKeySigner, client: BlockchainClient) -> Self {
        tracing::info!(address = %signer.address(), "Local wallet initialized");
        Self { signer, client }
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn request(&self, request: &WalletRequest) -> WalletResult<Value> {
        match request {
            WalletRequest::Accounts | WalletRequest::RequestAccounts => {
                Ok(json!([self.address().to_string()]))
            }
            WalletRequest::SendTransaction(transfer) => {
                if transfer.from != self.address() {
                    return Err(WalletError::from_rpc(
                        UNAUTHORIZED_CODE,
                        format!("account {} is not controlled by this wallet", transfer.from),
                    ));
                }
                let tx = build_transfer(transfer.from, transfer.to, transfer.value);
                let hash = self.client.send_transaction(tx).await?;
                tracing::info!(tx_hash = %hash, to = %transfer.to, "Transfer broadcast");
                Ok(json!(hash.to_string()))
            }
        }
    }
}
