//! Printer address policy.
//!
//! The dispatcher opens outbound TCP connections on behalf of its callers,
//! so every target passes through [`AddressPolicy::validate`] first. Rules
//! are applied in order and the first failure decides the rejection:
//!
//! 1. dotted quad of four 1-3 digit groups
//! 2. every group at most 255
//! 3. not loopback `127.0.0.1`, not `0.0.0.0`, not `255.255.255.255`, first
//!    octet not 0
//! 4. member of the allow-list, when one is configured
//! 5. port within [`PORT_RANGE`]

use std::net::{Ipv4Addr, SocketAddrV4};
use std::ops::RangeInclusive;

use tracing::{debug, warn};

use crate::AddressRejection;

/// Default ZPL raw printing port (JetDirect / RAW).
pub const DEFAULT_PORT: u16 = 9100;

/// Ports a print job may target.
pub const PORT_RANGE: RangeInclusive<u16> = 9100..=9109;

/// Addresses refused regardless of configuration.
const DENIED: [Ipv4Addr; 3] = [
    Ipv4Addr::LOCALHOST,
    Ipv4Addr::UNSPECIFIED,
    Ipv4Addr::BROADCAST,
];

/// Immutable target policy: static deny rules plus an optional allow-list.
///
/// Built once at startup and shared read-only by every dispatch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressPolicy {
    allow_list: Option<Vec<String>>,
}

impl AddressPolicy {
    /// A policy with no allow-list: any address passing the static rules
    /// is accepted. Logs a warning, once, at construction.
    pub fn unrestricted() -> Self {
        warn!(
            "no printer allow-list configured; any non-reserved IPv4 address on ports {}-{} may be targeted",
            PORT_RANGE.start(),
            PORT_RANGE.end()
        );
        Self { allow_list: None }
    }

    /// A policy that only admits the listed addresses (matched verbatim,
    /// after trimming each entry). Blank entries are ignored; if nothing is
    /// left the policy is [`unrestricted`](Self::unrestricted).
    pub fn with_allow_list<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list: Vec<String> = addresses
            .into_iter()
            .map(|a| a.as_ref().trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();

        if list.is_empty() {
            return Self::unrestricted();
        }
        debug!(count = list.len(), "printer allow-list configured");
        Self {
            allow_list: Some(list),
        }
    }

    /// Build from the comma-separated configuration value
    /// (e.g. `ALLOWED_PRINTER_IPS=10.0.0.5,10.0.0.6`). `None` or an empty
    /// value means unrestricted.
    pub fn from_config(value: Option<&str>) -> Self {
        match value {
            Some(v) => Self::with_allow_list(v.split(',')),
            None => Self::unrestricted(),
        }
    }

    /// The configured allow-list, if any.
    pub fn allow_list(&self) -> Option<&[String]> {
        self.allow_list.as_deref()
    }

    /// Check `address:port` against the policy. Pure; performs no I/O.
    pub fn validate(&self, address: &str, port: u16) -> Result<SocketAddrV4, AddressRejection> {
        let octets = parse_dotted_quad(address)
            .ok_or_else(|| AddressRejection::MalformedFormat(address.to_string()))?;

        let mut bytes = [0u8; 4];
        for (slot, octet) in bytes.iter_mut().zip(octets) {
            *slot = u8::try_from(octet)
                .map_err(|_| AddressRejection::OctetOutOfRange(address.to_string()))?;
        }
        let ip = Ipv4Addr::from(bytes);

        if DENIED.contains(&ip) || bytes[0] == 0 {
            return Err(AddressRejection::Reserved(address.to_string()));
        }

        if let Some(list) = &self.allow_list
            && !list.iter().any(|allowed| allowed == address)
        {
            return Err(AddressRejection::NotInAllowList(address.to_string()));
        }

        if !PORT_RANGE.contains(&port) {
            return Err(AddressRejection::PortOutOfRange {
                port,
                min: *PORT_RANGE.start(),
                max: *PORT_RANGE.end(),
            });
        }

        Ok(SocketAddrV4::new(ip, port))
    }
}

/// Split `s` into four groups of 1-3 ASCII digits. Values are not range
/// checked here.
fn parse_dotted_quad(s: &str) -> Option<[u16; 4]> {
    let mut out = [0u16; 4];
    let mut groups = s.split('.');
    for slot in &mut out {
        let group = groups.next()?;
        if group.is_empty() || group.len() > 3 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *slot = group.parse().ok()?;
    }
    if groups.next().is_some() {
        return None;
    }
    Some(out)
}
