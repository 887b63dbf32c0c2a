//! ZPL label print client: guarded raw TCP dispatch to networked printers.
//!
//! Every target passes through an [`AddressPolicy`] before any socket is
//! opened. Delivery is one connection per call over port 9100 (JetDirect /
//! RAW): connect, write the whole document, let the printer settle, close.
//! The API is synchronous (`std::net`), with no async runtime required.
mod config;
mod error;
mod policy;
mod tcp;

pub use config::DispatchConfig;
pub use error::{AddressRejection, DispatchError};
pub use policy::{AddressPolicy, DEFAULT_PORT, PORT_RANGE};

use std::net::SocketAddr;
use std::time::Duration;

use tracing::debug;

/// Outcome of a successful [`Dispatcher::send`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SendReport {
    /// Bytes written; always the full payload length.
    pub bytes_sent: usize,
}

/// Outcome of a successful [`Dispatcher::test_connection`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ConnectionReport {
    /// Time from the start of the connect attempt until it was established.
    #[cfg_attr(feature = "serde", serde(rename = "latencyMs", serialize_with = "as_millis"))]
    pub latency: Duration,
}

impl ConnectionReport {
    /// Latency in whole milliseconds.
    pub fn latency_ms(&self) -> u64 {
        u64::try_from(self.latency.as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(feature = "serde")]
fn as_millis<S: serde::Serializer>(latency: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(latency.as_millis()).unwrap_or(u64::MAX))
}

/// Sends documents to printers the policy admits.
///
/// Holds only read-only configuration, so one dispatcher can be shared
/// across threads; concurrent calls each use their own connection.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    policy: AddressPolicy,
    config: DispatchConfig,
}

impl Dispatcher {
    /// A dispatcher with the default timing budget.
    pub fn new(policy: AddressPolicy) -> Self {
        Self::with_config(policy, DispatchConfig::default())
    }

    /// A dispatcher with an explicit timing budget.
    pub fn with_config(policy: AddressPolicy, config: DispatchConfig) -> Self {
        Self { policy, config }
    }

    /// The address policy in force.
    pub fn policy(&self) -> &AddressPolicy {
        &self.policy
    }

    /// The timing budget in force.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Deliver `payload` to `address:port`.
    ///
    /// Rejected targets fail before any network activity. On success the
    /// whole payload was written and the connection closed gracefully; on
    /// any failure the connection has been torn down and nothing may be
    /// assumed about what the printer received.
    pub fn send(
        &self,
        payload: &[u8],
        address: &str,
        port: u16,
    ) -> Result<SendReport, DispatchError> {
        let addr = self.admit(address, port)?;
        let bytes_sent = tcp::deliver(
            addr,
            payload,
            self.config.send_timeout,
            self.config.settle_delay,
        )?;
        Ok(SendReport { bytes_sent })
    }

    /// Deliver a ZPL document (convenience wrapper over [`send`](Self::send)).
    pub fn send_zpl(
        &self,
        zpl: &str,
        address: &str,
        port: u16,
    ) -> Result<SendReport, DispatchError> {
        self.send(zpl.as_bytes(), address, port)
    }

    /// Check that `address:port` accepts connections. Nothing is written.
    pub fn test_connection(
        &self,
        address: &str,
        port: u16,
    ) -> Result<ConnectionReport, DispatchError> {
        let addr = self.admit(address, port)?;
        let latency = tcp::probe(addr, self.config.test_timeout)?;
        Ok(ConnectionReport { latency })
    }

    /// Render and send the built-in diagnostic label, stamped with
    /// `timestamp`.
    pub fn print_test_label(
        &self,
        address: &str,
        port: u16,
        timestamp: &str,
    ) -> Result<SendReport, DispatchError> {
        let zpl = zpl_label_core::test_label(address, timestamp);
        self.send_zpl(&zpl, address, port)
    }

    fn admit(&self, address: &str, port: u16) -> Result<SocketAddr, DispatchError> {
        let addr = self.policy.validate(address, port).inspect_err(|e| {
            debug!(address, port, reason = %e, "printer target rejected");
        })?;
        Ok(SocketAddr::V4(addr))
    }
}
