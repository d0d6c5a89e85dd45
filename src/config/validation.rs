//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the selected network exists
//! - Validate value ranges (timeouts > 0, chain id > 0)
//! - Validate addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use alloy::primitives::Address;

use crate::config::schema::{AppConfig, NetworkConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.active_network().is_none() {
        errors.push(ValidationError::new(
            "network.active",
            format!("network '{}' is not defined", config.network.active),
        ));
    }

    for (name, network) in &config.network.networks {
        validate_network(name, network, &mut errors);
    }

    if !config.contract.address.is_empty()
        && config.contract.address.parse::<Address>().is_err()
    {
        errors.push(ValidationError::new(
            "contract.address",
            format!("'{}' is not a valid address", config.contract.address),
        ));
    }

    if config.storage.path.trim().is_empty() {
        errors.push(ValidationError::new("storage.path", "must not be empty"));
    }

    if config.sync.interval_secs == 0 {
        errors.push(ValidationError::new("sync.interval_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a valid socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_network(name: &str, network: &NetworkConfig, errors: &mut Vec<ValidationError>) {
    let prefix = format!("network.networks.{}", name);

    if network.rpc_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::new(
            format!("{}.rpc_url", prefix),
            format!("'{}' is not a valid URL", network.rpc_url),
        ));
    }
    for failover in &network.failover_urls {
        if failover.parse::<url::Url>().is_err() {
            errors.push(ValidationError::new(
                format!("{}.failover_urls", prefix),
                format!("'{}' is not a valid URL", failover),
            ));
        }
    }
    if network.chain_id == 0 {
        errors.push(ValidationError::new(
            format!("{}.chain_id", prefix),
            "must be greater than 0",
        ));
    }
    if network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new(
            format!("{}.rpc_timeout_secs", prefix),
            "must be greater than 0",
        ));
    }
    if network.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            format!("{}.confirmation_timeout_secs", prefix),
            "must be greater than 0",
        ));
    }
    if network.poll_interval_ms == 0 {
        errors.push(ValidationError::new(
            format!("{}.poll_interval_ms", prefix),
            "must be greater than 0",
        ));
    }
}
