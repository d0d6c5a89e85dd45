//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the network that is always available.
pub const DEFAULT_NETWORK: &str = "localhost";

/// Root configuration for the transfer client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Network selection and the named network table.
    pub network: NetworkSelection,

    /// Deployed record-keeping contract.
    pub contract: ContractConfig,

    /// Which wallet provider signs transfers.
    pub wallet: WalletConfig,

    /// Durable key-value store settings.
    pub storage: StorageConfig,

    /// Periodic state synchronisation.
    pub sync: SyncConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Resolve the active network settings.
    ///
    /// Returns `None` when `network.active` names a network that is not
    /// present in the table.
    pub fn active_network(&self) -> Option<&NetworkConfig> {
        self.network.networks.get(&self.network.active)
    }
}

/// Named networks, in the shape of a contract deployment config.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkSelection {
    /// Name of the network to connect to.
    pub active: String,

    /// Known networks keyed by name.
    pub networks: BTreeMap<String, NetworkConfig>,
}

impl Default for NetworkSelection {
    fn default() -> Self {
        let mut networks = BTreeMap::new();
        networks.insert(DEFAULT_NETWORK.to_string(), NetworkConfig::default());
        Self {
            active: DEFAULT_NETWORK.to_string(),
            networks,
        }
    }
}

/// Connection settings for a single network.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID (e.g., 1 for Ethereum mainnet, 31337 for a local dev node).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of block confirmations required before a transfer counts as confirmed.
    pub confirmation_blocks: u32,

    /// Upper bound on waiting for confirmation, in seconds.
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 31337,
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 300,
            poll_interval_ms: 2000,
        }
    }
}

/// Record-keeping contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ContractConfig {
    /// Address of the deployed `Transactions` contract.
    pub address: String,
}

/// Wallet provider kinds.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    /// Accounts managed by the node behind the RPC endpoint.
    #[default]
    Rpc,
    /// A private key loaded from the environment.
    Local,
}

/// Wallet configuration.
///
/// Private keys are never read from the config file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WalletConfig {
    pub kind: WalletKind,
}

/// Durable store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON key-value file.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "transfer-dapp.store.json".to_string(),
        }
    }
}

/// Periodic sync configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Interval between account/counter checks in seconds.
    pub interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { interval_secs: 15 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
