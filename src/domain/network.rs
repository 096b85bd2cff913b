// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants
//!
//! Ports, host addresses and the address kinds a host may expose. Every
//! constructor validates, so a value that exists is a value that can be dialed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid port: {0} (must be 1-65535)")]
    InvalidPort(u32),

    #[error("Address is empty")]
    EmptyAddress,

    #[error("Address exceeds maximum length of 253 characters: {0}")]
    AddressTooLong(usize),

    #[error("Invalid DNS label in address {address}: {label}")]
    InvalidLabel { address: String, label: String },
}

/// TCP/UDP port value object
///
/// Invariant: 1-65535. Port 0 is never a valid connection target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Create a new port with validation
    pub fn new(port: u32) -> Result<Self, NetworkError> {
        match u16::try_from(port) {
            Ok(p) if p != 0 => Ok(Self(p)),
            _ => Err(NetworkError::InvalidPort(port)),
        }
    }

    /// Get the port number
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for Port {
    type Error = NetworkError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Network address of a host: an IP literal or an RFC 1123 hostname
///
/// # Examples
///
/// ```rust
/// use infralink::domain::NetworkAddress;
///
/// let ip = NetworkAddress::new("100.78.109.111").unwrap();
/// assert!(ip.is_ip());
///
/// let v6 = NetworkAddress::new("2001:db8::1").unwrap();
/// assert_eq!(v6.url_host(), "[2001:db8::1]");
///
/// assert!(NetworkAddress::new("-bad.example.com").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NetworkAddress {
    raw: String,
    ip: Option<IpAddr>,
}

impl NetworkAddress {
    /// Maximum total length for a DNS name (RFC 1123)
    pub const MAX_LENGTH: usize = 253;

    /// Maximum length for a single DNS label
    pub const MAX_LABEL_LENGTH: usize = 63;

    /// Create a new address with validation
    pub fn new(address: impl AsRef<str>) -> Result<Self, NetworkError> {
        let address = address.as_ref().trim();

        if address.is_empty() {
            return Err(NetworkError::EmptyAddress);
        }

        if let Ok(ip) = IpAddr::from_str(address) {
            return Ok(Self {
                raw: ip.to_string(),
                ip: Some(ip),
            });
        }

        if address.len() > Self::MAX_LENGTH {
            return Err(NetworkError::AddressTooLong(address.len()));
        }

        let name = address.strip_suffix('.').unwrap_or(address);
        for label in name.split('.') {
            if !Self::is_valid_label(label) {
                return Err(NetworkError::InvalidLabel {
                    address: address.to_string(),
                    label: label.to_string(),
                });
            }
        }

        Ok(Self {
            raw: name.to_ascii_lowercase(),
            ip: None,
        })
    }

    fn is_valid_label(label: &str) -> bool {
        !label.is_empty()
            && label.len() <= Self::MAX_LABEL_LENGTH
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            && !label.starts_with('-')
            && !label.ends_with('-')
    }

    /// Address as written (canonical form)
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed IP when the address is a literal
    pub fn ip(&self) -> Option<IpAddr> {
        self.ip
    }

    pub fn is_ip(&self) -> bool {
        self.ip.is_some()
    }

    /// Host component for URLs and `host:port` strings; IPv6 literals are bracketed
    pub fn url_host(&self) -> String {
        match self.ip {
            Some(IpAddr::V6(v6)) => format!("[{}]", v6),
            _ => self.raw.clone(),
        }
    }

    /// `host:port` endpoint string
    pub fn endpoint(&self, port: Port) -> String {
        format!("{}:{}", self.url_host(), port)
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for NetworkAddress {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for NetworkAddress {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NetworkAddress> for String {
    fn from(address: NetworkAddress) -> Self {
        address.raw
    }
}

/// Kind of network address a host may carry (at most one of each)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    /// Private mesh-network address (e.g. Tailscale)
    Overlay,
    Public,
    Private,
}

impl AddressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overlay => "overlay",
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which address kind resolution tries first
///
/// The remaining kinds follow in overlay, public, private order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressPreference {
    #[default]
    Overlay,
    Public,
    Private,
}

impl AddressPreference {
    /// Resolution order for this preference
    pub fn order(&self) -> [AddressKind; 3] {
        use AddressKind::*;
        match self {
            Self::Overlay => [Overlay, Public, Private],
            Self::Public => [Public, Overlay, Private],
            Self::Private => [Private, Overlay, Public],
        }
    }
}

impl FromStr for AddressPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overlay" | "tailscale" => Ok(Self::Overlay),
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(format!("unknown address preference: {}", other)),
        }
    }
}

/// Addresses of a host keyed by kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostAddresses {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<NetworkAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<NetworkAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<NetworkAddress>,
}

impl HostAddresses {
    pub fn get(&self, kind: AddressKind) -> Option<&NetworkAddress> {
        match kind {
            AddressKind::Overlay => self.overlay.as_ref(),
            AddressKind::Public => self.public.as_ref(),
            AddressKind::Private => self.private.as_ref(),
        }
    }

    /// First configured address in preference order, with its kind
    pub fn select(&self, preference: AddressPreference) -> Option<(AddressKind, &NetworkAddress)> {
        preference
            .order()
            .into_iter()
            .find_map(|kind| self.get(kind).map(|addr| (kind, addr)))
    }

    pub fn is_empty(&self) -> bool {
        self.overlay.is_none() && self.public.is_none() && self.private.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_range() {
        assert!(Port::new(1).is_ok());
        assert!(Port::new(65535).is_ok());
        assert_eq!(Port::new(0), Err(NetworkError::InvalidPort(0)));
        assert_eq!(Port::new(65536), Err(NetworkError::InvalidPort(65536)));
    }

    #[test]
    fn test_port_deserialization_validates() {
        let port: Port = serde_json::from_str("5432").unwrap();
        assert_eq!(port.value(), 5432);
        assert!(serde_json::from_str::<Port>("0").is_err());
        assert!(serde_json::from_str::<Port>("70000").is_err());
    }

    #[test]
    fn test_addresses() {
        assert!(NetworkAddress::new("100.78.109.111").unwrap().is_ip());
        assert!(NetworkAddress::new("db01.internal.example.com").is_ok());
        assert!(NetworkAddress::new("").is_err());
        assert!(NetworkAddress::new("bad_name.example.com").is_err());
        assert!(NetworkAddress::new("invalid..com").is_err());
        assert!(NetworkAddress::new(format!("{}.com", "a".repeat(64))).is_err());
    }

    #[test]
    fn test_hostname_is_lowercased() {
        let addr = NetworkAddress::new("DB01.Example.COM.").unwrap();
        assert_eq!(addr.as_str(), "db01.example.com");
    }

    #[test]
    fn test_ipv6_endpoint_is_bracketed() {
        let addr = NetworkAddress::new("2001:db8::1").unwrap();
        assert_eq!(addr.endpoint(Port::new(5432).unwrap()), "[2001:db8::1]:5432");
    }

    #[test]
    fn test_preference_order() {
        let addrs = HostAddresses {
            overlay: Some(NetworkAddress::new("100.64.0.1").unwrap()),
            public: Some(NetworkAddress::new("91.99.122.86").unwrap()),
            private: Some(NetworkAddress::new("10.0.0.5").unwrap()),
        };

        let (kind, addr) = addrs.select(AddressPreference::Overlay).unwrap();
        assert_eq!(kind, AddressKind::Overlay);
        assert_eq!(addr.as_str(), "100.64.0.1");

        let (kind, _) = addrs.select(AddressPreference::Private).unwrap();
        assert_eq!(kind, AddressKind::Private);
    }

    #[test]
    fn test_preference_skips_missing_kinds() {
        let addrs = HostAddresses {
            overlay: None,
            public: None,
            private: Some(NetworkAddress::new("10.0.0.5").unwrap()),
        };
        let (kind, _) = addrs.select(AddressPreference::Overlay).unwrap();
        assert_eq!(kind, AddressKind::Private);
        assert!(HostAddresses::default().select(AddressPreference::Overlay).is_none());
    }

    #[test]
    fn test_preference_parsing() {
        assert_eq!("tailscale".parse(), Ok(AddressPreference::Overlay));
        assert_eq!("PUBLIC".parse(), Ok(AddressPreference::Public));
        assert!("ipv9".parse::<AddressPreference>().is_err());
    }
}
