//! Lifecycle management for long-running modes.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast → background sync task exits → watch loop returns
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
