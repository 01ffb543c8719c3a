//! Connection liveness for stream transports.
//!
//! [`ManagedConnection`] wraps an established byte-stream connection and answers
//! "is this connection still usable?" without consuming application data and without
//! blocking on an idle peer. A zero-length read is a bounded connectivity probe. Any byte
//! the probe pulls off the wire is buffered and returned first by the next read.

pub mod config;
pub mod net;
pub mod observability;

pub use config::{LivenessConfig, ProbeConfig};
pub use net::{Connection, Liveness, ManagedConnection, ProbeOutcome};
