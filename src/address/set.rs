//! Anycast addresses and the ordered set this host may announce.

use std::fmt;
use std::net::IpAddr;

use serde::Serialize;
use thiserror::Error;

/// Failure to parse an `ip/prefix` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrError {
    #[error("missing prefix length (expected ip/prefix)")]
    MissingPrefix,

    #[error("`{0}` is not an IP address")]
    InvalidIp(String),

    #[error("prefix length `{prefix}` out of range 0..={max}")]
    InvalidPrefix { prefix: String, max: u8 },
}

/// One anycast address bound to a named interface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AnycastAddress {
    ip: IpAddr,
    prefix_len: u8,
    interface: String,
}

impl AnycastAddress {
    pub fn new(ip: IpAddr, prefix_len: u8, interface: impl Into<String>) -> Result<Self, CidrError> {
        let max = max_prefix(&ip);
        if prefix_len > max {
            return Err(CidrError::InvalidPrefix {
                prefix: prefix_len.to_string(),
                max,
            });
        }
        Ok(Self {
            ip,
            prefix_len,
            interface: interface.into(),
        })
    }

    /// Parse `ip/prefix` for the given interface.
    pub fn parse(cidr: &str, interface: &str) -> Result<Self, CidrError> {
        let (ip, prefix) = cidr.trim().split_once('/').ok_or(CidrError::MissingPrefix)?;
        let ip: IpAddr = ip
            .parse()
            .map_err(|_| CidrError::InvalidIp(ip.to_string()))?;
        let max = max_prefix(&ip);
        let prefix_len: u8 = prefix.parse().map_err(|_| CidrError::InvalidPrefix {
            prefix: prefix.to_string(),
            max,
        })?;
        Self::new(ip, prefix_len, interface)
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Canonical `ip/prefix` text, as iproute2 prints it.
    pub fn cidr(&self) -> String {
        format!("{}/{}", self.ip, self.prefix_len)
    }
}

impl fmt::Display for AnycastAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip, self.prefix_len)
    }
}

fn max_prefix(ip: &IpAddr) -> u8 {
    match ip {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

/// Failure to build an [`AddressSet`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressSetError {
    #[error("address set is empty")]
    Empty,

    #[error("`{cidr}`: {source}")]
    Cidr { cidr: String, source: CidrError },

    #[error("duplicate address `{0}`")]
    Duplicate(String),
}

/// Ordered, duplicate-free list of anycast addresses on one interface.
///
/// Immutable once built; iteration order is the order mutations are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSet {
    interface: String,
    addresses: Vec<AnycastAddress>,
}

impl AddressSet {
    pub fn from_cidrs<I, S>(interface: &str, cidrs: I) -> Result<Self, AddressSetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut addresses: Vec<AnycastAddress> = Vec::new();
        for cidr in cidrs {
            let cidr = cidr.as_ref();
            let address = AnycastAddress::parse(cidr, interface).map_err(|source| {
                AddressSetError::Cidr {
                    cidr: cidr.to_string(),
                    source,
                }
            })?;
            if addresses.contains(&address) {
                return Err(AddressSetError::Duplicate(address.cidr()));
            }
            addresses.push(address);
        }

        if addresses.is_empty() {
            return Err(AddressSetError::Empty);
        }

        Ok(Self {
            interface: interface.to_string(),
            addresses,
        })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AnycastAddress> {
        self.addresses.iter()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn contains(&self, address: &AnycastAddress) -> bool {
        self.addresses.contains(address)
    }
}

impl<'a> IntoIterator for &'a AddressSet {
    type Item = &'a AnycastAddress;
    type IntoIter = std::slice::Iter<'a, AnycastAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
