//! Configuration types for the print client.

use std::time::Duration;

/// Timing budget for dispatch calls.
///
/// Defaults are the fixed budgets of the raw-print protocol:
/// - `send_timeout`: 10s, covering both connect and any write stall
/// - `test_timeout`: 5s for a connectivity probe
/// - `settle_delay`: 100ms between the last write and closing the socket,
///   so the printer can drain its receive buffer
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Connect and write-stall timeout for [`send`](crate::Dispatcher::send).
    pub send_timeout: Duration,
    /// Connect timeout for [`test_connection`](crate::Dispatcher::test_connection).
    pub test_timeout: Duration,
    /// Pause after a successful write before the connection is closed.
    pub settle_delay: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_secs(10),
            test_timeout: Duration::from_secs(5),
            settle_delay: Duration::from_millis(100),
        }
    }
}
