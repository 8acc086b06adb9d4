//! Address block derivation.
//!
//! Every network-enabled account gets its blocks by substituting one
//! positional component of a shared base block with a small per-account
//! octet. The prefix length of the base block is always preserved.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::ConfigError;
use crate::models::{AccountOctets, NetworkHeader};
use crate::services::NetworkService;

/// Positional component of an `a.b.c.d` address that may be substituted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OctetPosition {
    Second,
    Third,
    Fourth,
}

impl OctetPosition {
    /// Zero-based index into the four address components
    fn index(self) -> usize {
        match self {
            OctetPosition::Second => 1,
            OctetPosition::Third => 2,
            OctetPosition::Fourth => 3,
        }
    }
}

/// An IPv4 address block in `a.b.c.d/n` notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CidrBlock {
    addr: Ipv4Addr,
    prefix_len: u8,
}

impl CidrBlock {
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> Result<Self, ConfigError> {
        if prefix_len > 32 {
            return Err(ConfigError::InvalidBlockFormat {
                block: format!("{}/{}", addr, prefix_len),
            });
        }
        Ok(Self { addr, prefix_len })
    }

    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Return a copy with one address component replaced
    pub fn with_octet(&self, position: OctetPosition, value: u8) -> Self {
        let mut octets = self.addr.octets();
        octets[position.index()] = value;
        Self {
            addr: Ipv4Addr::from(octets),
            prefix_len: self.prefix_len,
        }
    }

    /// True when no host bits are set below the prefix
    pub fn is_network_aligned(&self) -> bool {
        let host_mask = u32::MAX.checked_shr(u32::from(self.prefix_len)).unwrap_or(0);
        u32::from(self.addr) & host_mask == 0
    }
}

impl FromStr for CidrBlock {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidBlockFormat {
            block: s.to_string(),
        };

        let (addr, prefix) = s.trim().split_once('/').ok_or_else(invalid)?;
        let addr: Ipv4Addr = addr.parse().map_err(|_| invalid())?;
        let prefix_len: u8 = prefix.parse().map_err(|_| invalid())?;
        Self::new(addr, prefix_len).map_err(|_| invalid())
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}

impl Serialize for CidrBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Replace one component of `base` with `value`, keeping the prefix length.
///
/// # Examples
/// ```
/// use infra_mgmt::ip::{replace_octet, OctetPosition};
///
/// let block = replace_octet("10.0.0.0/16", OctetPosition::Second, 5).unwrap();
/// assert_eq!(block.to_string(), "10.5.0.0/16");
/// assert!(replace_octet("10.0.0/16", OctetPosition::Second, 5).is_err());
/// ```
pub fn replace_octet(base: &str, position: OctetPosition, value: u8) -> Result<CidrBlock, ConfigError> {
    let block: CidrBlock = base.parse()?;
    Ok(block.with_octet(position, value))
}

/// Parse the four base blocks of the network header, in VPC, subnet,
/// public subnet, client pool order
pub fn parse_base_blocks(header: &NetworkHeader) -> Result<[CidrBlock; 4], ConfigError> {
    Ok([
        header.vpc_cidr_block_base.parse()?,
        header.subnet_cidr_block.parse()?,
        header.public_subnet_cidr_block_base.parse()?,
        header.client_cidr_block_base.parse()?,
    ])
}

/// Derive the four network blocks of one account from the shared bases.
///
/// The non-client octet lands in the second position of the VPC, subnet and
/// public subnet blocks; the client octet lands in the third position of the
/// VPN client pool block.
pub fn derive_network_service(
    header: &NetworkHeader,
    octets: AccountOctets,
) -> Result<NetworkService, ConfigError> {
    let [vpc, subnet, public_subnet, client] = parse_base_blocks(header)?;
    let service = NetworkService {
        vpc_cidr_block: vpc.with_octet(OctetPosition::Second, octets.vpc_and_subnet),
        subnet_cidr_block: subnet.with_octet(OctetPosition::Second, octets.vpc_and_subnet),
        public_subnet_cidr_block: public_subnet.with_octet(OctetPosition::Second, octets.vpc_and_subnet),
        client_cidr_block: client.with_octet(OctetPosition::Third, octets.client),
        octets,
    };

    for block in service.blocks() {
        if !block.is_network_aligned() {
            log::warn!("Derived block {} has host bits set below its prefix", block);
        }
    }

    Ok(service)
}
