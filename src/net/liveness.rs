//! Liveness classification.
//!
//! # Responsibilities
//! - Classify probe results (idle, readable, buffered, closed, error)
//! - Tell a bounded-wait timeout apart from a broken connection
//! - Provide the `Liveness` surface consumed by transport code
//!
//! # Design Decisions
//! - A timeout during a bounded probe means "open, nothing to read"
//! - End-of-stream and reset-class errors mean the peer is gone
//! - A missing connection is reported as not open, never as a panic

use std::fmt;
use std::io;
use std::time::Duration;

/// Returns true if `err` is what a socket reports when a read deadline elapses.
///
/// Unix sockets report `WouldBlock` (EAGAIN), windows reports `TimedOut`.
pub fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

pub(crate) fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "connection is not established")
}

pub(crate) fn closed_by_peer() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed by peer")
}

/// Result of a single liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeOutcome {
    /// Nothing arrived before the deadline; the connection is open and idle.
    Idle,
    /// A byte arrived and was buffered for the next read.
    Readable,
    /// A byte from an earlier probe is still buffered; the wire was not touched.
    Buffered,
    /// The peer closed or reset the stream, or there is no connection.
    Closed,
    /// The read failed for another reason.
    Failed,
}

impl ProbeOutcome {
    /// Classify the error returned by a probe read.
    pub fn from_error(err: &io::Error) -> Self {
        if is_timeout(err) {
            return ProbeOutcome::Idle;
        }
        match err.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected => ProbeOutcome::Closed,
            _ => ProbeOutcome::Failed,
        }
    }

    /// Whether the connection can still be used after this outcome.
    pub fn is_alive(self) -> bool {
        matches!(
            self,
            ProbeOutcome::Idle | ProbeOutcome::Readable | ProbeOutcome::Buffered
        )
    }

    /// Stable label for logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            ProbeOutcome::Idle => "idle",
            ProbeOutcome::Readable => "readable",
            ProbeOutcome::Buffered => "buffered",
            ProbeOutcome::Closed => "closed",
            ProbeOutcome::Failed => "error",
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Connection liveness checks used before reusing an idle connection.
pub trait Liveness {
    /// Probe the connection without waiting for data. Never blocks past the probe timeout.
    fn is_open(&mut self) -> bool;

    /// Wait up to `timeout` for the connection to become readable.
    ///
    /// Returns a timeout error if nothing arrived, which for an otherwise healthy
    /// connection is the expected result.
    fn check_readable(&mut self, timeout: Duration) -> io::Result<()>;
}

impl<T: Liveness> Liveness for Option<T> {
    fn is_open(&mut self) -> bool {
        match self {
            Some(conn) => conn.is_open(),
            None => false,
        }
    }

    fn check_readable(&mut self, timeout: Duration) -> io::Result<()> {
        match self {
            Some(conn) => conn.check_readable(timeout),
            None => Err(not_connected()),
        }
    }
}
