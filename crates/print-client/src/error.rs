//! Typed error types for the print client.
//!
//! Messages are written for end users: every transport error embeds the
//! target address and the underlying OS error text.

use std::io;
use std::time::Duration;

/// Why the address policy refused a target. Detected before any network
/// activity; always the caller's fault and never worth retrying.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressRejection {
    /// Not four dot-separated groups of 1-3 digits.
    #[error("invalid printer IP format: {0}")]
    MalformedFormat(String),

    /// Well-formed, but an octet exceeds 255.
    #[error("invalid printer IP address: {0}")]
    OctetOutOfRange(String),

    /// Loopback, broadcast, or "this network" target.
    #[error("printer IP {0} is not allowed")]
    Reserved(String),

    /// An allow-list is configured and the address is not on it.
    #[error("printer IP {0} is not in the allowed printer list")]
    NotInAllowList(String),

    /// Port outside the raw-print port block.
    #[error("printer port {port} is outside the allowed range {min}-{max}")]
    PortOutOfRange {
        /// The requested port.
        port: u16,
        /// Lowest permitted port.
        min: u16,
        /// Highest permitted port.
        max: u16,
    },
}

/// Failure of a dispatch call. There is no partial success: if any of these
/// is returned, the payload must be assumed not delivered.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    // -- Validation --
    /// The address policy refused the target; no connection was attempted.
    #[error(transparent)]
    Rejected(#[from] AddressRejection),

    // -- Connection --
    /// The printer actively refused the connection (e.g. port not open).
    #[error("failed to connect to printer at {addr}: connection refused ({source})")]
    ConnectionRefused {
        /// The address that was attempted.
        addr: String,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The connection was not established within the timeout.
    #[error("connection to printer at {addr} timed out after {} seconds", .timeout.as_secs_f64())]
    ConnectionTimeout {
        /// The address that was attempted.
        addr: String,
        /// The timeout that elapsed.
        timeout: Duration,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Connection failed for a reason other than refusal or timeout
    /// (host unreachable, network down, ...).
    #[error("failed to connect to printer at {addr}: {source}")]
    ConnectionFailed {
        /// The address that was attempted.
        addr: String,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    // -- I/O --
    /// Writing the payload failed.
    #[error("failed to send data to printer at {addr}: {source}")]
    WriteFailed {
        /// The connected address.
        addr: String,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The printer stopped draining its receive buffer and the write stalled
    /// past the timeout.
    #[error("sending to printer at {addr} stalled for more than {} seconds", .timeout.as_secs_f64())]
    WriteTimeout {
        /// The connected address.
        addr: String,
        /// The timeout that elapsed.
        timeout: Duration,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl DispatchError {
    /// `true` for failures raised by the address policy before any I/O.
    pub fn is_validation(&self) -> bool {
        matches!(self, DispatchError::Rejected(_))
    }

    /// `true` when the fixed timeout budget fired.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            DispatchError::ConnectionTimeout { .. } | DispatchError::WriteTimeout { .. }
        )
    }

    /// The policy rejection, if this is a validation failure.
    pub fn rejection(&self) -> Option<&AddressRejection> {
        match self {
            DispatchError::Rejected(r) => Some(r),
            _ => None,
        }
    }
}
