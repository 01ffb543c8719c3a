//! Metrics collection.
//!
//! # Metrics
//! - `liveconn_probes_total` (counter): liveness probes by outcome
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; a no-op until an exporter is installed

use crate::net::ProbeOutcome;

pub const PROBES_TOTAL: &str = "liveconn_probes_total";

/// Record one liveness probe.
pub fn record_probe(outcome: ProbeOutcome) {
    ::metrics::counter!(PROBES_TOTAL, "outcome" => outcome.as_str()).increment(1);
}
