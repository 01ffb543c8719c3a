//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! net::managed probes produce:
//!     → logging.rs (structured trace/debug events)
//!     → metrics.rs (probe outcome counters)
//! ```
//!
//! # Design Decisions
//! - The library only emits events; the binary installs the subscriber
//! - Metrics are cheap (atomic increments) and optional

pub mod logging;
pub mod metrics;
