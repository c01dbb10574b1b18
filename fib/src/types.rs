// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

#[derive(Debug, Copy, Clone, Serialize, Deserialize, Eq, Hash, PartialEq)]
pub struct Prefix4 {
    pub value: Ipv4Addr,
    pub length: u8,
}

impl PartialOrd for Prefix4 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Prefix4 {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.value != other.value {
            return self.value.cmp(&other.value);
        }
        self.length.cmp(&other.length)
    }
}

impl Prefix4 {
    /// Create a new `Prefix4` from an IP address and mask length. The
    /// newly created `Prefix4` will have its host bits zeroed upon
    /// creation.
    pub fn new(ip: Ipv4Addr, length: u8) -> Self {
        let mut new = Self { value: ip, length };
        new.unset_host_bits();
        new
    }

    fn mask(&self) -> u32 {
        match self.length {
            0 => 0,
            _ => (!0u32) << (32 - self.length),
        }
    }

    pub fn host_bits_are_unset(&self) -> bool {
        self.value.to_bits() & self.mask() == self.value.to_bits()
    }

    pub fn unset_host_bits(&mut self) {
        self.value = Ipv4Addr::from_bits(self.value.to_bits() & self.mask())
    }

    /// Check if an address falls within this prefix. Cross-family
    /// addresses are never contained.
    pub fn contains(&self, addr: IpAddr) -> bool {
        match addr {
            IpAddr::V4(a) => {
                a.to_bits() & self.mask() == self.value.to_bits() & self.mask()
            }
            IpAddr::V6(_) => false,
        }
    }
}

impl fmt::Display for Prefix4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.value, self.length)
    }
}

impl FromStr for Prefix4 {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, length) =
            s.split_once('/').ok_or("malformed prefix".to_string())?;

        let length: u8 = length
            .parse()
            .map_err(|_| "malformed length".to_string())?;
        if length > 32 {
            return Err("prefix length must be <= 32".to_string());
        }

        Ok(Self {
            value: value
                .parse()
                .map_err(|_| "malformed ip addr".to_string())?,
            length,
        })
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, Hash, Eq, PartialEq)]
pub struct Prefix6 {
    pub value: Ipv6Addr,
    pub length: u8,
}

impl PartialOrd for Prefix6 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Prefix6 {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.value != other.value {
            return self.value.cmp(&other.value);
        }
        self.length.cmp(&other.length)
    }
}

impl Prefix6 {
    /// Create a new `Prefix6` from an IP address and mask length. The
    /// newly created `Prefix6` will have its host bits zeroed upon
    /// creation.
    pub fn new(ip: Ipv6Addr, length: u8) -> Self {
        let mut new = Self { value: ip, length };
        new.unset_host_bits();
        new
    }

    fn mask(&self) -> u128 {
        match self.length {
            0 => 0,
            _ => (!0u128) << (128 - self.length),
        }
    }

    pub fn host_bits_are_unset(&self) -> bool {
        self.value.to_bits() & self.mask() == self.value.to_bits()
    }

    pub fn unset_host_bits(&mut self) {
        self.value = Ipv6Addr::from_bits(self.value.to_bits() & self.mask())
    }

    /// Check if an address falls within this prefix. Cross-family
    /// addresses are never contained.
    pub fn contains(&self, addr: IpAddr) -> bool {
        match addr {
            IpAddr::V6(a) => {
                a.to_bits() & self.mask() == self.value.to_bits() & self.mask()
            }
            IpAddr::V4(_) => false,
        }
    }
}

impl fmt::Display for Prefix6 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.value, self.length)
    }
}

impl FromStr for Prefix6 {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, length) =
            s.split_once('/').ok_or("malformed prefix".to_string())?;

        let length: u8 = length
            .parse()
            .map_err(|_| "malformed length".to_string())?;
        if length > 128 {
            return Err("prefix length must be <= 128".to_string());
        }

        Ok(Self {
            value: value
                .parse()
                .map_err(|_| "malformed ip addr".to_string())?,
            length,
        })
    }
}

#[derive(
    Debug,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
)]
pub enum Prefix {
    V4(Prefix4),
    V6(Prefix6),
}

impl Prefix {
    pub fn new(ip: IpAddr, length: u8) -> Self {
        match ip {
            IpAddr::V4(ip4) => Self::V4(Prefix4::new(ip4, length)),
            IpAddr::V6(ip6) => Self::V6(Prefix6::new(ip6, length)),
        }
    }

    /// Check if an address falls within this prefix. Returns false for
    /// cross-family comparisons.
    pub fn contains(&self, addr: IpAddr) -> bool {
        match self {
            Prefix::V4(p4) => p4.contains(addr),
            Prefix::V6(p6) => p6.contains(addr),
        }
    }

    pub fn is_v4(&self) -> bool {
        matches!(self, Prefix::V4(_))
    }
}

impl std::fmt::Display for Prefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Prefix::V4(p) => p.fmt(f),
            Prefix::V6(p) => p.fmt(f),
        }
    }
}

impl From<Prefix4> for Prefix {
    fn from(value: Prefix4) -> Self {
        Self::V4(value)
    }
}

impl From<Prefix6> for Prefix {
    fn from(value: Prefix6) -> Self {
        Self::V6(value)
    }
}

impl FromStr for Prefix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(prefix4) = s.parse::<Prefix4>() {
            Ok(Self::V4(prefix4))
        } else if let Ok(prefix6) = s.parse::<Prefix6>() {
            Ok(Self::V6(prefix6))
        } else {
            Err("malformed prefix".to_string())
        }
    }
}

#[derive(
    Debug,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
)]
pub struct MacAddr(pub [u8; 6]);

impl Display for MacAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let m = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }
}

impl FromStr for MacAddr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err("expected six mac address octets".to_string());
        }
        for (i, p) in parts.iter().enumerate() {
            octets[i] = u8::from_str_radix(p, 16)
                .map_err(|_| format!("malformed mac address octet {p}"))?;
        }
        Ok(MacAddr(octets))
    }
}

/// A (device, port) pair identifying a network attachment point.
#[derive(
    Debug,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
)]
pub struct ConnectPoint {
    pub device: String,
    pub port: u32,
}

impl ConnectPoint {
    pub fn new(device: impl Into<String>, port: u32) -> Self {
        Self {
            device: device.into(),
            port,
        }
    }
}

impl Display for ConnectPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device, self.port)
    }
}

impl FromStr for ConnectPoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (device, port) = s
            .rsplit_once('/')
            .ok_or("malformed connect point".to_string())?;
        if device.is_empty() {
            return Err("connect point has no device".to_string());
        }
        Ok(Self {
            device: device.to_string(),
            port: port
                .parse()
                .map_err(|_| "malformed connect point port".to_string())?,
        })
    }
}

/// A network-facing interface as reported by the interface source.
/// Immutable snapshot value, new events carry whole new snapshots.
/// Two logical interfaces may share a connect point while carrying
/// different VLAN tags.
#[derive(
    Debug,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
)]
pub struct Interface {
    pub name: String,
    pub connect_point: ConnectPoint,
    pub addresses: BTreeSet<Prefix>,
    pub mac: MacAddr,
    pub vlan_id: Option<u16>,
}

impl Interface {
    /// True if one of this interface's subnets covers `addr`.
    pub fn covers(&self, addr: IpAddr) -> bool {
        self.addresses.iter().any(|p| p.contains(addr))
    }

    /// True if one of this interface's own addresses is exactly `addr`.
    pub fn owns(&self, addr: IpAddr) -> bool {
        self.addresses.iter().any(|p| match (p, addr) {
            (Prefix::V4(p4), IpAddr::V4(a)) => p4.value == a,
            (Prefix::V6(p6), IpAddr::V6(a)) => p6.value == a,
            _ => false,
        })
    }
}

impl Display for Interface {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.connect_point)
    }
}

/// A route learned from the route source. Immutable value.
#[derive(
    Debug,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
)]
pub struct RouteEntry {
    pub prefix: Prefix,
    pub nexthop: IpAddr,
}

impl Display for RouteEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} via {}", self.prefix, self.nexthop)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub enum InterfaceEvent {
    Added(Interface),
    Removed(Interface),
}

impl InterfaceEvent {
    pub fn interface(&self) -> &Interface {
        match self {
            InterfaceEvent::Added(i) => i,
            InterfaceEvent::Removed(i) => i,
        }
    }
}
