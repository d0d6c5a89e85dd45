//! Transfer building and confirmation monitoring.
//!
//! # Responsibilities
//! - Build plain value-transfer requests with the fixed transfer gas limit
//! - Poll receipts until the required block depth is reached

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, ConfirmationStatus, TRANSFER_GAS_LIMIT,
};

/// Build a native value transfer request.
///
/// Nonce, fees and chain id are left to the provider's fillers.
pub fn build_transfer(from: Address, to: Address, value: U256) -> TransactionRequest {
    TransactionRequest::default()
        .with_from(from)
        .with_to(to)
        .with_value(value)
        .with_gas_limit(TRANSFER_GAS_LIMIT)
}

/// Wait for a transaction to be confirmed.
///
/// Polls every `poll_interval_ms` until the receipt is at least
/// `confirmation_blocks` deep, giving up after `confirmation_timeout_secs`.
pub async fn wait_for_confirmation(
    client: &BlockchainClient,
    tx_hash: TxHash,
) -> BlockchainResult<ConfirmationStatus> {
    let config = client.config();
    let required_confirmations = client.confirmation_blocks();
    let timeout_secs = config.confirmation_timeout_secs;
    let poll_interval = Duration::from_millis(config.poll_interval_ms);

    let result = timeout(Duration::from_secs(timeout_secs), async {
        let mut ticker = interval(poll_interval);

        loop {
            ticker.tick().await;

            let receipt = match client.get_transaction_receipt(tx_hash).await? {
                Some(r) => r,
                None => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    continue;
                }
            };

            if !receipt.status() {
                return Ok(ConfirmationStatus::Failed("Transaction reverted".to_string()));
            }

            let current_block = client.get_block_number().await?;
            let tx_block = receipt.block_number.unwrap_or(current_block);
            let depth = confirmations(current_block, tx_block);

            if depth >= required_confirmations {
                return Ok(ConfirmationStatus::Confirmed {
                    block_number: tx_block,
                });
            }

            tracing::debug!(
                tx_hash = %tx_hash,
                confirmations = depth,
                required = required_confirmations,
                "Waiting for confirmations"
            );
        }
    })
    .await;

    match result {
        Ok(status) => status,
        Err(_) => Err(BlockchainError::ConfirmationTimeout(timeout_secs)),
    }
}

/// Block depth of a transaction included at `included`.
///
/// The inclusion block counts as the first confirmation; depths beyond
/// `u32::MAX` saturate.
fn confirmations(current_block: u64, included: u64) -> u32 {
    u32::try_from(current_block.saturating_sub(included))
        .unwrap_or(u32::MAX)
        .saturating_add(1)
}
