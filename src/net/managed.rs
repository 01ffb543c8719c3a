//! Connection wrapper with a non-destructive liveness probe.
//!
//! # Responsibilities
//! - Answer "is this connection still usable?" without waiting for data
//! - Buffer any byte a probe pulls off the wire and hand it back first
//! - Delegate the rest of the stream contract to the wrapped connection
//!
//! # Read Contract
//! ```text
//! read(&mut [])      → probe: Ok(0) if open (idle or readable), Err if closed/broken
//! read(&mut [..n])   → pending bytes first, then the wire for the remainder
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Read, Write};
use std::mem;
use std::time::{Duration, Instant};

use crate::config::ProbeConfig;
use crate::net::connection::Connection;
use crate::net::liveness::{self, is_timeout, Liveness, ProbeOutcome};
use crate::observability::metrics;

/// Default bound on the zero-length read probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(1);

/// A stream connection that can be probed for liveness.
///
/// A zero-length [`Read::read`] is a connectivity probe rather than a readability wait:
/// it makes one bounded attempt to read a single byte. A timeout means the connection is
/// open and idle. A byte that does arrive is kept in `pending` and returned ahead of any
/// newer wire data, so probing never changes what the caller reads.
///
/// Not meant to be shared between threads without external synchronization; all
/// operations take `&mut self`.
pub struct ManagedConnection {
    /// The wrapped connection. `None` when absent or after close.
    underlying: Option<Box<dyn Connection>>,
    /// Bytes read by a probe and not yet delivered, oldest first.
    pending: VecDeque<u8>,
    /// Bound on the zero-length read probe.
    probe_timeout: Duration,
    /// Wire error hit while buffered bytes were being delivered; reported by the next read.
    deferred: Option<io::Error>,
}

impl ManagedConnection {
    /// Wrap a connection.
    ///
    /// Wrapping a connection that is already a `ManagedConnection` (directly or boxed)
    /// returns that instance, pending bytes included, instead of nesting a second layer.
    pub fn wrap<C: Connection>(mut conn: C) -> Self {
        if let Some(managed) = conn.as_managed_mut() {
            return mem::take(managed);
        }
        Self {
            underlying: Some(Box::new(conn)),
            ..Self::default()
        }
    }

    /// Adapt the result of a dial or accept call.
    ///
    /// The error is returned unchanged and no wrapper is created.
    ///
    /// ```no_run
    /// use std::net::TcpStream;
    /// use liveconn::net::ManagedConnection;
    ///
    /// let mut conn = ManagedConnection::from_result(TcpStream::connect("127.0.0.1:9090"))?;
    /// assert!(conn.is_open());
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn from_result<C: Connection>(result: io::Result<C>) -> io::Result<Self> {
        result.map(Self::wrap)
    }

    /// Set the bound used by zero-length reads and [`is_open`](Self::is_open).
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Apply probe settings from configuration.
    pub fn with_config(self, config: &ProbeConfig) -> Self {
        self.with_probe_timeout(config.timeout())
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Number of probed bytes waiting to be read.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn is_valid(&self) -> bool {
        self.underlying.is_some()
    }

    /// Returns true if the connection is still usable.
    ///
    /// Never blocks longer than the probe timeout and never discards data.
    pub fn is_open(&mut self) -> bool {
        if !self.is_valid() {
            return false;
        }
        self.probe().is_alive()
    }

    /// Probe the connection and report what was observed.
    pub fn probe(&mut self) -> ProbeOutcome {
        if !self.is_valid() {
            return ProbeOutcome::Closed;
        }
        match self.liveness_probe() {
            Ok(outcome) => outcome,
            Err(err) => ProbeOutcome::from_error(&err),
        }
    }

    /// Wait up to `timeout` for one byte to become readable.
    ///
    /// A byte read from the wire is buffered and returned by the next read. If a byte is
    /// already buffered this succeeds without touching the wire. The read deadline is
    /// cleared before returning, whatever the result. A timeout is returned as an error;
    /// callers asking "is it open?" should use [`is_open`](Self::is_open) instead.
    pub fn check_readable(&mut self, timeout: Duration) -> io::Result<()> {
        self.probe_once(timeout).map(drop)
    }

    /// Zero-length read path: a timeout is success.
    fn liveness_probe(&mut self) -> io::Result<ProbeOutcome> {
        match self.probe_once(self.probe_timeout) {
            Err(err) if is_timeout(&err) => Ok(ProbeOutcome::Idle),
            result => result,
        }
    }

    fn probe_once(&mut self, timeout: Duration) -> io::Result<ProbeOutcome> {
        let result = self.fetch_probe_byte(timeout);
        let outcome = match &result {
            Ok(outcome) => *outcome,
            Err(err) => ProbeOutcome::from_error(err),
        };
        metrics::record_probe(outcome);

        match &result {
            Err(err) if !outcome.is_alive() => {
                tracing::debug!(
                    outcome = %outcome,
                    error = %err,
                    "Connection probe failed"
                );
            }
            _ => {
                tracing::trace!(
                    outcome = %outcome,
                    timeout = ?timeout,
                    pending = self.pending.len(),
                    "Connection probe completed"
                );
            }
        }
        result
    }

    fn fetch_probe_byte(&mut self, timeout: Duration) -> io::Result<ProbeOutcome> {
        let conn = self.underlying.as_mut().ok_or_else(liveness::not_connected)?;

        if self.pending.is_empty() {
            if let Some(err) = &self.deferred {
                return Err(io::Error::new(err.kind(), err.to_string()));
            }
        }

        // An overflowing deadline is as good as none.
        conn.set_read_deadline(Instant::now().checked_add(timeout))?;

        let result = if self.pending.is_empty() {
            match read_one(&mut **conn) {
                Ok(byte) => {
                    self.pending.push_back(byte);
                    Ok(ProbeOutcome::Readable)
                }
                Err(err) => Err(err),
            }
        } else {
            Ok(ProbeOutcome::Buffered)
        };

        let cleared = conn.set_read_deadline(None);
        match (result, cleared) {
            (Ok(outcome), cleared) => cleared.map(|_| outcome),
            (Err(err), Err(clear_err)) => {
                tracing::debug!(error = %clear_err, "Clearing read deadline failed");
                Err(err)
            }
            (Err(err), Ok(())) => Err(err),
        }
    }

    fn drain_pending(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        n
    }
}

fn read_one(conn: &mut dyn Connection) -> io::Result<u8> {
    let mut byte = [0u8; 1];
    loop {
        match conn.read(&mut byte) {
            Ok(0) => return Err(liveness::closed_by_peer()),
            Ok(_) => return Ok(byte[0]),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

impl Default for ManagedConnection {
    /// An absent connection: never open, reads and writes fail with `NotConnected`.
    fn default() -> Self {
        Self {
            underlying: None,
            pending: VecDeque::new(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            deferred: None,
        }
    }
}

impl fmt::Debug for ManagedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedConnection")
            .field("connected", &self.is_valid())
            .field("pending", &self.pending.len())
            .field("probe_timeout", &self.probe_timeout)
            .field("deferred", &self.deferred)
            .finish()
    }
}

impl Read for ManagedConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return self.liveness_probe().map(|_| 0);
        }

        let drained = self.drain_pending(buf);
        if drained == buf.len() {
            return Ok(drained);
        }
        if drained > 0 && self.deferred.is_some() {
            return Ok(drained);
        }
        if let Some(err) = self.deferred.take() {
            return Err(err);
        }

        let Some(conn) = self.underlying.as_mut() else {
            return if drained > 0 {
                Ok(drained)
            } else {
                Err(liveness::not_connected())
            };
        };

        match conn.read(&mut buf[drained..]) {
            Ok(n) => Ok(drained + n),
            // Buffered bytes go out first; a hard error is held for the next read
            // since sockets report a reset only once.
            Err(err) if drained > 0 => {
                if !is_timeout(&err) && err.kind() != io::ErrorKind::Interrupted {
                    tracing::trace!(
                        delivered = drained,
                        error = %err,
                        "Deferring read error behind buffered bytes"
                    );
                    self.deferred = Some(err);
                }
                Ok(drained)
            }
            Err(err) => Err(err),
        }
    }
}

impl Write for ManagedConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.underlying.as_mut() {
            Some(conn) => conn.write(buf),
            None => Err(liveness::not_connected()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.underlying.as_mut() {
            Some(conn) => conn.flush(),
            None => Ok(()),
        }
    }
}

impl Connection for ManagedConnection {
    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        match self.underlying.as_mut() {
            Some(conn) => conn.set_read_deadline(deadline),
            None => Ok(()),
        }
    }

    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        match self.underlying.as_mut() {
            Some(conn) => conn.set_write_deadline(deadline),
            None => Ok(()),
        }
    }

    /// Close the wrapped connection. Buffered bytes stay readable.
    fn close(&mut self) -> io::Result<()> {
        match self.underlying.take() {
            Some(mut conn) => {
                tracing::debug!(pending = self.pending.len(), "Closing managed connection");
                conn.close()
            }
            None => Ok(()),
        }
    }

    fn as_managed_mut(&mut self) -> Option<&mut ManagedConnection> {
        Some(self)
    }
}

impl Liveness for ManagedConnection {
    fn is_open(&mut self) -> bool {
        ManagedConnection::is_open(self)
    }

    fn check_readable(&mut self, timeout: Duration) -> io::Result<()> {
        ManagedConnection::check_readable(self, timeout)
    }
}
