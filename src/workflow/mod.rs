//! Transaction-submission workflow subsystem.
//!
//! # Data Flow
//! ```text
//! UI events (field edits, connect, submit, cancel)
//!     → engine.rs (TransactionWorkflow)
//!         → WalletProvider (accounts, transfer approval)
//!         → ContractClient (record, confirm, history, counter)
//!         → PersistedCounter (durable transaction count)
//!     → SessionState published on a watch channel
//!     → UI reads snapshots or awaits changes
//! ```

pub mod engine;
pub mod history;
pub mod types;

pub use engine::TransactionWorkflow;
pub use history::Transaction;
pub use types::{
    FormField, FormInput, SessionState, SubmissionPhase, SubmitReceipt, WorkflowError,
    WorkflowResult,
};
