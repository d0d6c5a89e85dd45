//! Transaction counter mirrored into the durable store.

use std::sync::Arc;

use crate::storage::store::{KeyValueStore, StorageResult};

/// Key under which the counter is persisted.
pub const TRANSACTION_COUNT_KEY: &str = "transactionCount";

/// In-memory counter value backed by a key-value store.
///
/// The in-memory value is authoritative for readers; `store` writes through
/// before updating it, so a failed write leaves both sides unchanged.
pub struct PersistedCounter {
    store: Arc<dyn KeyValueStore>,
    value: Option<u64>,
}

impl PersistedCounter {
    /// Read the persisted value once.
    ///
    /// A value that does not parse is ignored; the next refresh overwrites it.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let value = match store.get(TRANSACTION_COUNT_KEY) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(value = %raw, "Ignoring unparsable persisted transaction count");
                    None
                }
            },
            None => None,
        };
        Self { store, value }
    }

    /// Last known count, `None` if never fetched.
    pub fn value(&self) -> Option<u64> {
        self.value
    }

    /// Persist a freshly queried count.
    pub fn store(&mut self, count: u64) -> StorageResult<()> {
        self.store.set(TRANSACTION_COUNT_KEY, &count.to_string())?;
        self.value = Some(count);
        Ok(())
    }
}
