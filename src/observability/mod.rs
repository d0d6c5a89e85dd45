//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stderr (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, long-running mode only)
//! ```
//!
//! # Design Decisions
//! - Each submission carries a UUID through its span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
