//! Durable storage subsystem.
//!
//! # Data Flow
//! ```text
//! startup: FileStore::open → PersistedCounter::load (read once)
//! refresh: contract count → PersistedCounter::store → FileStore::set → file
//! ```
//!
//! # Design Decisions
//! - One JSON object file holds every key
//! - Writes go through a temp file and rename so a crash never truncates it

pub mod counter;
pub mod store;

pub use counter::{PersistedCounter, TRANSACTION_COUNT_KEY};
pub use store::{FileStore, KeyValueStore, MemoryStore, StorageError};
