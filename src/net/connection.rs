//! Byte-stream connection abstraction.
//!
//! # Responsibilities
//! - Define the stream contract the liveness adapter is layered on
//! - Map absolute read/write deadlines onto socket timeouts
//! - Expose the capability hook used for idempotent wrapping

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::{Duration, Instant};

use crate::net::managed::ManagedConnection;

/// Shortest timeout handed to a socket. The OS reads a zero timeout as "block forever"
/// (and std rejects it), so an elapsed deadline maps to this instead.
const MIN_SOCKET_TIMEOUT: Duration = Duration::from_micros(1);

/// An established, bidirectional byte-stream connection.
///
/// Deadlines are absolute points in time after which a blocked read or write fails with
/// a timeout error (`WouldBlock` on unix, `TimedOut` on windows). `None` clears the
/// deadline.
pub trait Connection: Read + Write + Send + 'static {
    /// Set the deadline for future and pending reads.
    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()>;

    /// Set the deadline for future and pending writes.
    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()>;

    /// Set both the read and write deadline.
    fn set_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.set_read_deadline(deadline)?;
        self.set_write_deadline(deadline)
    }

    /// Close the connection in both directions.
    fn close(&mut self) -> io::Result<()>;

    /// Returns the connection as a [`ManagedConnection`] if it already is one.
    fn as_managed_mut(&mut self) -> Option<&mut ManagedConnection> {
        None
    }
}

/// Convert an absolute deadline into the relative timeout a socket understands.
pub(crate) fn deadline_to_timeout(deadline: Option<Instant>) -> Option<Duration> {
    deadline.map(|at| {
        at.saturating_duration_since(Instant::now())
            .max(MIN_SOCKET_TIMEOUT)
    })
}

impl Connection for TcpStream {
    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.set_read_timeout(deadline_to_timeout(deadline))
    }

    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.set_write_timeout(deadline_to_timeout(deadline))
    }

    fn close(&mut self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}

#[cfg(unix)]
impl Connection for std::os::unix::net::UnixStream {
    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.set_read_timeout(deadline_to_timeout(deadline))
    }

    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.set_write_timeout(deadline_to_timeout(deadline))
    }

    fn close(&mut self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        (**self).set_read_deadline(deadline)
    }

    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        (**self).set_write_deadline(deadline)
    }

    fn set_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        (**self).set_deadline(deadline)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }

    fn as_managed_mut(&mut self) -> Option<&mut ManagedConnection> {
        (**self).as_managed_mut()
    }
}
