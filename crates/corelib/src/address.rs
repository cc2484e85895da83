//! Remote endpoint addresses.
//!
//! Remotes are written as `Host:Port` or `Host:Port:Family`. Family is the
//! numeric socket family understood by the storage servers: `2` for IPv4 and
//! `10` for IPv6. IPv6 literal hosts must be bracketed (`[::1]:1025:10`) so the
//! separators stay unambiguous.

use std::fmt;
use std::str::FromStr;

/// Address family requested for a remote.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum AddressFamily {
    /// Let the engine infer the family from the host.
    #[default]
    Unspecified,
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    /// Wire code of this family (`0` when unspecified).
    pub fn code(self) -> u8 {
        match self {
            AddressFamily::Unspecified => 0,
            AddressFamily::Ipv4 => 2,
            AddressFamily::Ipv6 => 10,
        }
    }

    /// Family for an explicit wire code. Only `2` and `10` are accepted.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            2 => Some(AddressFamily::Ipv4),
            10 => Some(AddressFamily::Ipv6),
            _ => None,
        }
    }
}

/// Reasons an address string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address has an empty host")]
    EmptyHost,
    #[error("address is missing a port")]
    MissingPort,
    #[error("invalid port {0:?}")]
    InvalidPort(String),
    #[error("unsupported address family {0:?} (expected 2 or 10)")]
    UnsupportedFamily(String),
    #[error("malformed address {0:?}")]
    Malformed(String),
}

/// A parsed `Host:Port[:Family]` remote.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct RemoteAddress {
    pub host: String,
    pub port: u16,
    pub family: AddressFamily,
}

impl RemoteAddress {
    pub fn new(host: impl Into<String>, port: u16, family: AddressFamily) -> Self {
        Self {
            host: host.into(),
            port,
            family,
        }
    }
}

impl FromStr for RemoteAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, rest) = split_host(s)?;
        if host.is_empty() {
            return Err(AddressError::EmptyHost);
        }

        let mut fields = rest.split(':');
        let port = match fields.next() {
            Some("") | None => return Err(AddressError::MissingPort),
            Some(port) => parse_port(port)?,
        };
        let family = match fields.next() {
            None => AddressFamily::Unspecified,
            Some(family) => parse_family(family)?,
        };
        if fields.next().is_some() {
            return Err(AddressError::Malformed(s.to_string()));
        }

        Ok(Self::new(host, port, family))
    }
}

/// Splits off the host, returning it and everything after the first
/// separator that follows it.
fn split_host(s: &str) -> Result<(&str, &str), AddressError> {
    if let Some(bracketed) = s.strip_prefix('[') {
        let (host, rest) = bracketed
            .split_once(']')
            .ok_or_else(|| AddressError::Malformed(s.to_string()))?;
        return match rest.strip_prefix(':') {
            Some(rest) => Ok((host, rest)),
            None if rest.is_empty() => Err(AddressError::MissingPort),
            None => Err(AddressError::Malformed(s.to_string())),
        };
    }

    s.split_once(':').ok_or(AddressError::MissingPort)
}

fn parse_port(port: &str) -> Result<u16, AddressError> {
    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(AddressError::InvalidPort(port.to_string())),
        Ok(port) => Ok(port),
    }
}

fn parse_family(family: &str) -> Result<AddressFamily, AddressError> {
    family
        .parse::<u8>()
        .ok()
        .and_then(AddressFamily::from_code)
        .ok_or_else(|| AddressError::UnsupportedFamily(family.to_string()))
}

impl fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)?;
        } else {
            write!(f, "{}:{}", self.host, self.port)?;
        }
        match self.family {
            AddressFamily::Unspecified => Ok(()),
            family => write!(f, ":{}", family.code()),
        }
    }
}
