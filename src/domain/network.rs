// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

use super::vocabulary::{Bounds, MTU_BOUNDS, SPEED_BOUNDS};

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length {prefix} for {address}")]
    InvalidPrefixLength { address: String, prefix: u8 },

    #[error("Invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("{field} out of range: {value} not in {bounds}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        bounds: Bounds,
    },
}

/// IP address in CIDR notation
///
/// NetBox stores every address with its prefix length, so the prefix is
/// mandatory here.
///
/// # Examples
///
/// ```rust
/// use cim_netbox_reconciler::domain::CidrAddress;
///
/// let ip = CidrAddress::new("192.168.1.10/24").unwrap();
/// assert_eq!(ip.address().to_string(), "192.168.1.10");
/// assert_eq!(ip.prefix_length(), 24);
/// assert!(CidrAddress::new("192.168.1.10").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CidrAddress {
    address: IpAddr,
    prefix_length: u8,
}

impl CidrAddress {
    /// Parse `address/prefix`
    ///
    /// # Invariants
    /// - Valid IPv4 or IPv6 address
    /// - Prefix 0-32 for IPv4, 0-128 for IPv6
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref().trim();

        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let address = IpAddr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;

        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(address, prefix_length)
    }

    /// Create from separate address and prefix
    pub fn from_parts(address: IpAddr, prefix_length: u8) -> Result<Self, NetworkError> {
        let max_prefix = match address {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };

        if prefix_length > max_prefix {
            return Err(NetworkError::InvalidPrefixLength {
                address: address.to_string(),
                prefix: prefix_length,
            });
        }

        Ok(Self {
            address,
            prefix_length,
        })
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }

    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }
}

impl fmt::Display for CidrAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_length)
    }
}

impl TryFrom<String> for CidrAddress {
    type Error = NetworkError;

    fn try_from(cidr: String) -> Result<Self, Self::Error> {
        Self::new(cidr)
    }
}

impl From<CidrAddress> for String {
    fn from(cidr: CidrAddress) -> Self {
        cidr.to_string()
    }
}

impl FromStr for CidrAddress {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// MAC Address value object
///
/// Represents a 48-bit MAC address with validation.
/// Invariants:
/// - Valid MAC address format (6 octets)
/// - Canonical representation (uppercase, colon-separated, as NetBox renders it)
///
/// # Examples
///
/// ```rust
/// use cim_netbox_reconciler::domain::MacAddress;
///
/// let mac = MacAddress::new("00-11-22-aa-bb-cc").unwrap();
/// assert_eq!(mac.to_string(), "00:11:22:AA:BB:CC");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Create a new MAC address with validation
    ///
    /// Accepts colon, hyphen or no separators.
    pub fn new(mac: impl AsRef<str>) -> Result<Self, NetworkError> {
        let mac = mac.as_ref().trim();
        let mac_clean = mac.replace([':', '-'], "");

        // Invariant: Must be exactly 12 hex digits (6 octets)
        if mac_clean.len() != 12 || !mac_clean.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(NetworkError::InvalidMacAddress(mac.to_string()));
        }

        let mut octets = [0u8; 6];
        for (i, chunk) in mac_clean.as_bytes().chunks(2).enumerate() {
            let hex_str = std::str::from_utf8(chunk)
                .map_err(|_| NetworkError::InvalidMacAddress(mac.to_string()))?;
            octets[i] = u8::from_str_radix(hex_str, 16)
                .map_err(|_| NetworkError::InvalidMacAddress(mac.to_string()))?;
        }

        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for MacAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Interface speed in kbps, as NetBox stores it
///
/// Out-of-range values are rejected rather than clamped: a truncated speed
/// would be silently wrong inventory data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct InterfaceSpeed(i64);

impl InterfaceSpeed {
    /// Create a new speed within `[0, 2147483647]`
    pub fn new(kbps: i64) -> Result<Self, NetworkError> {
        if !SPEED_BOUNDS.contains(kbps) {
            return Err(NetworkError::OutOfRange {
                field: "speed",
                value: kbps,
                bounds: SPEED_BOUNDS,
            });
        }
        Ok(Self(kbps))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Interface MTU (Maximum Transmission Unit)
///
/// Invariants:
/// - At least 1 byte; no upper bound is imposed by the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Mtu(i64);

impl Mtu {
    /// Create a new MTU of at least 1
    pub fn new(size: i64) -> Result<Self, NetworkError> {
        if !MTU_BOUNDS.contains(size) {
            return Err(NetworkError::OutOfRange {
                field: "mtu",
                value: size,
                bounds: MTU_BOUNDS,
            });
        }
        Ok(Self(size))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
