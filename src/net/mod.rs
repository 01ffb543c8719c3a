//! Connection subsystem.
//!
//! # Data Flow
//! ```text
//! Dial / accept result (io::Result<C>)
//!     → managed.rs (ManagedConnection::from_result / wrap)
//!
//! Caller read(buf):
//!     buf empty  → liveness probe (bounded one-byte read)
//!     buf filled → drain pending bytes → read remainder from connection.rs
//!
//! Caller is_open() / check_readable(timeout):
//!     → set read deadline
//!     → read one byte into pending (unless a byte is already pending)
//!     → clear read deadline
//!     → liveness.rs (classify timeout vs. closed)
//! ```
//!
//! # Design Decisions
//! - One explicit probe path on every platform, no reliance on zero-length read semantics
//! - Probed bytes are buffered, never discarded, and always delivered first
//! - Wrapping is idempotent through a capability hook on the `Connection` trait
//! - Absent connections are safe to call: not-open, not a panic

pub mod connection;
pub mod liveness;
pub mod managed;

pub use connection::Connection;
pub use liveness::{is_timeout, Liveness, ProbeOutcome};
pub use managed::{ManagedConnection, DEFAULT_PROBE_TIMEOUT};
