//! Shared utilities for integration tests.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use liveconn::net::Connection;

/// A connected loopback TCP pair: (local, remote).
#[allow(dead_code)]
pub fn tcp_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let local = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
    let (remote, _) = listener.accept().unwrap();
    (local, remote)
}

/// One scripted response to a read call.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Step {
    /// Deliver these bytes (split across reads if the buffer is smaller).
    Data(Vec<u8>),
    /// Fail the way an elapsed read deadline does on unix.
    Timeout,
    /// Fail with `Interrupted`.
    Interrupted,
    /// Fail with the given kind.
    Fail(io::ErrorKind),
    /// Return end-of-stream.
    Eof,
}

/// Everything a [`ScriptedConnection`] observed.
#[derive(Debug, Default)]
pub struct ScriptState {
    pub steps: VecDeque<Step>,
    pub reads: usize,
    pub read_deadlines: Vec<Option<Instant>>,
    pub write_deadlines: Vec<Option<Instant>>,
    pub written: Vec<u8>,
    pub closed: bool,
    /// Fail every attempt to clear the read deadline.
    pub fail_deadline_clear: bool,
}

/// In-memory connection that replays a read script and records every call.
///
/// Clones share state, so a test keeps one clone for inspection and hands the
/// other to the code under test. Reads past the end of the script return EOF.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnection {
    state: Arc<Mutex<ScriptState>>,
}

#[allow(dead_code)]
impl ScriptedConnection {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        let conn = Self::default();
        conn.state().steps.extend(steps);
        conn
    }

    pub fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap()
    }

    pub fn push(&self, step: Step) {
        self.state().steps.push_back(step);
    }
}

impl Read for ScriptedConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state();
        state.reads += 1;
        match state.steps.pop_front() {
            Some(Step::Data(bytes)) => {
                let n = buf.len().min(bytes.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    state.steps.push_front(Step::Data(bytes[n..].to_vec()));
                }
                Ok(n)
            }
            Some(Step::Timeout) => Err(io::ErrorKind::WouldBlock.into()),
            Some(Step::Interrupted) => Err(io::ErrorKind::Interrupted.into()),
            Some(Step::Fail(kind)) => Err(kind.into()),
            Some(Step::Eof) | None => Ok(0),
        }
    }
}

impl Write for ScriptedConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state().written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Connection for ScriptedConnection {
    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        let mut state = self.state();
        state.read_deadlines.push(deadline);
        if deadline.is_none() && state.fail_deadline_clear {
            return Err(io::Error::other("setsockopt failed"));
        }
        Ok(())
    }

    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.state().write_deadlines.push(deadline);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.state().closed = true;
        Ok(())
    }
}
