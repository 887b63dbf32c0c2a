//! TCP transport for ZPL printers (port 9100 / JetDirect / RAW).
//!
//! Every call opens its own connection, uses it once, and tears it down.
//! [`Connection`] owns the socket for that lifetime: the only graceful exit
//! is [`Connection::close`]; dropping it any other way (an error, a timeout,
//! a panic) aborts the socket with `SO_LINGER = 0`, so no path leaves a
//! connection open.

use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use socket2::SockRef;
use tracing::{debug, info, warn};

use crate::DispatchError;

/// A single-use connection to a printer.
pub(crate) struct Connection {
    stream: TcpStream,
    addr: SocketAddr,
    timeout: Duration,
    closed: bool,
}

impl Connection {
    /// Connect within `timeout`. The same budget bounds each later write.
    pub(crate) fn open(addr: SocketAddr, timeout: Duration) -> Result<Self, DispatchError> {
        let stream = TcpStream::connect_timeout(&addr, timeout).map_err(|e| {
            warn!(%addr, error = %e, "printer connection error");
            match e.kind() {
                io::ErrorKind::ConnectionRefused => DispatchError::ConnectionRefused {
                    addr: addr.to_string(),
                    source: e,
                },
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                    DispatchError::ConnectionTimeout {
                        addr: addr.to_string(),
                        timeout,
                        source: e,
                    }
                }
                _ => DispatchError::ConnectionFailed {
                    addr: addr.to_string(),
                    source: e,
                },
            }
        })?;

        // From here on the guard owns the socket; any early return aborts it.
        let conn = Self {
            stream,
            addr,
            timeout,
            closed: false,
        };
        conn.configure()?;
        info!(%addr, "connected to printer");
        Ok(conn)
    }

    fn configure(&self) -> Result<(), DispatchError> {
        let failed = |e| DispatchError::ConnectionFailed {
            addr: self.addr.to_string(),
            source: e,
        };
        // TCP_NODELAY -- the payload goes out in one burst, don't hold the tail
        self.stream.set_nodelay(true).map_err(failed)?;
        self.stream
            .set_write_timeout(Some(self.timeout))
            .map_err(failed)?;
        Ok(())
    }

    /// Write the whole payload. Returns the number of bytes written, which
    /// is always `payload.len()` on success.
    pub(crate) fn write_payload(&mut self, payload: &[u8]) -> Result<usize, DispatchError> {
        self.stream
            .write_all(payload)
            .and_then(|()| self.stream.flush())
            .map_err(|e| {
                warn!(addr = %self.addr, error = %e, "failed to send data to printer");
                match e.kind() {
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
                        DispatchError::WriteTimeout {
                            addr: self.addr.to_string(),
                            timeout: self.timeout,
                            source: e,
                        }
                    }
                    _ => DispatchError::WriteFailed {
                        addr: self.addr.to_string(),
                        source: e,
                    },
                }
            })?;
        Ok(payload.len())
    }

    /// Wait `settle`, then close gracefully (FIN after the buffered data).
    pub(crate) fn close(mut self, settle: Duration) {
        if !settle.is_zero() {
            thread::sleep(settle);
        }
        if let Err(e) = self.stream.shutdown(Shutdown::Write) {
            debug!(addr = %self.addr, error = %e, "shutdown after send failed");
        }
        self.closed = true;
        info!(addr = %self.addr, "connection to printer closed");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // Abortive close: discard unsent data and reset the peer.
        if let Err(e) = SockRef::from(&self.stream).set_linger(Some(Duration::ZERO)) {
            debug!(addr = %self.addr, error = %e, "failed to set SO_LINGER before abort");
        }
        debug!(addr = %self.addr, "connection to printer destroyed");
    }
}

/// Connect, write `payload`, settle, close. Returns the bytes written.
pub(crate) fn deliver(
    addr: SocketAddr,
    payload: &[u8],
    timeout: Duration,
    settle: Duration,
) -> Result<usize, DispatchError> {
    let mut conn = Connection::open(addr, timeout)?;
    let sent = conn.write_payload(payload)?;
    info!(%addr, bytes = sent, "sent data to printer");
    conn.close(settle);
    Ok(sent)
}

/// Connect and close immediately. Returns the time taken to connect.
pub(crate) fn probe(addr: SocketAddr, timeout: Duration) -> Result<Duration, DispatchError> {
    let started = Instant::now();
    let conn = Connection::open(addr, timeout)?;
    let latency = started.elapsed();
    info!(%addr, latency_ms = latency.as_millis() as u64, "test connection successful");
    conn.close(Duration::ZERO);
    Ok(latency)
}
