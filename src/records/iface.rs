// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Interface list records.
//!
//! Entries are packed back to back as `[type: u16][name_len: u16][addresses][name]`,
//! all IPv4 entries first, then all IPv6 entries.

use super::{check_padding, checked_len, read_array, read_bytes, read_u16, read_u32};
use crate::error::{CaptureError, CaptureResult};
use byteorder::{NativeEndian, WriteBytesExt};
use std::net::{Ipv4Addr, Ipv6Addr};

pub const IFACE_TYPE_IPV4: u16 = 3;
pub const IFACE_TYPE_IPV6: u16 = 4;

const ENTRY_PREFIX: usize = 2 + 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Interface {
    /// Addresses are kept exactly as captured (network order in memory).
    pub addr: u32,
    pub netmask: u32,
    pub bcast: u32,
    pub name: Vec<u8>,
}

impl Ipv4Interface {
    const FIXED_SIZE: usize = ENTRY_PREFIX + 4 * 3;

    pub fn new(name: &str, addr: Ipv4Addr, netmask: Ipv4Addr, bcast: Ipv4Addr) -> Self {
        Self {
            addr: u32::from_ne_bytes(addr.octets()),
            netmask: u32::from_ne_bytes(netmask.octets()),
            bcast: u32::from_ne_bytes(bcast.octets()),
            name: name.as_bytes().to_vec(),
        }
    }

    pub fn address(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.addr.to_ne_bytes())
    }

    fn encode(&self, out: &mut Vec<u8>) -> CaptureResult<()> {
        out.write_u16::<NativeEndian>(IFACE_TYPE_IPV4)?;
        out.write_u16::<NativeEndian>(checked_len(&self.name, "interface name")?)?;
        out.write_u32::<NativeEndian>(self.addr)?;
        out.write_u32::<NativeEndian>(self.netmask)?;
        out.write_u32::<NativeEndian>(self.bcast)?;
        out.extend_from_slice(&self.name);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv6Interface {
    pub addr: [u8; 16],
    pub netmask: [u8; 16],
    pub bcast: [u8; 16],
    pub name: Vec<u8>,
}

impl Ipv6Interface {
    const FIXED_SIZE: usize = ENTRY_PREFIX + 16 * 3;

    pub fn new(name: &str, addr: Ipv6Addr, netmask: Ipv6Addr, bcast: Ipv6Addr) -> Self {
        Self {
            addr: addr.octets(),
            netmask: netmask.octets(),
            bcast: bcast.octets(),
            name: name.as_bytes().to_vec(),
        }
    }

    pub fn address(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.addr)
    }

    fn encode(&self, out: &mut Vec<u8>) -> CaptureResult<()> {
        out.write_u16::<NativeEndian>(IFACE_TYPE_IPV6)?;
        out.write_u16::<NativeEndian>(checked_len(&self.name, "interface name")?)?;
        out.extend_from_slice(&self.addr);
        out.extend_from_slice(&self.netmask);
        out.extend_from_slice(&self.bcast);
        out.extend_from_slice(&self.name);
        Ok(())
    }
}

/// Interface addresses split per family, each in capture order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceList {
    pub v4: Vec<Ipv4Interface>,
    pub v6: Vec<Ipv6Interface>,
}

impl InterfaceList {
    pub fn len(&self) -> usize {
        self.v4.len() + self.v6.len()
    }

    pub fn is_empty(&self) -> bool {
        self.v4.is_empty() && self.v6.is_empty()
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> CaptureResult<()> {
        for entry in &self.v4 {
            entry.encode(out)?;
        }
        for entry in &self.v6 {
            entry.encode(out)?;
        }
        Ok(())
    }

    pub fn decode(buf: &[u8]) -> CaptureResult<Self> {
        let mut list = Self::default();
        let mut offset = 0;

        while buf.len() - offset >= ENTRY_PREFIX {
            let entry_start = offset;
            let iftype = read_u16(buf, &mut offset, "interface")?;
            let name_len = read_u16(buf, &mut offset, "interface")? as usize;

            let fixed = match iftype {
                IFACE_TYPE_IPV4 => Ipv4Interface::FIXED_SIZE,
                IFACE_TYPE_IPV6 => Ipv6Interface::FIXED_SIZE,
                other => return Err(CaptureError::UnknownInterfaceType(other)),
            };
            let available = buf.len() - entry_start;
            if fixed + name_len > available {
                return Err(CaptureError::TruncatedRecord {
                    what: "interface",
                    needed: fixed + name_len,
                    available,
                });
            }

            if iftype == IFACE_TYPE_IPV4 {
                let addr = read_u32(buf, &mut offset, "interface")?;
                let netmask = read_u32(buf, &mut offset, "interface")?;
                let bcast = read_u32(buf, &mut offset, "interface")?;
                let name = read_bytes(buf, &mut offset, name_len, "interface name")?;
                list.v4.push(Ipv4Interface { addr, netmask, bcast, name });
            } else {
                let addr = read_array::<16>(buf, &mut offset, "interface")?;
                let netmask = read_array::<16>(buf, &mut offset, "interface")?;
                let bcast = read_array::<16>(buf, &mut offset, "interface")?;
                let name = read_bytes(buf, &mut offset, name_len, "interface name")?;
                list.v6.push(Ipv6Interface { addr, netmask, bcast, name });
            }
        }

        check_padding(buf, offset, "interface")?;
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_PATH_SIZE;

    fn sample() -> InterfaceList {
        InterfaceList {
            v4: vec![
                Ipv4Interface::new(
                    "lo",
                    Ipv4Addr::new(127, 0, 0, 1),
                    Ipv4Addr::new(255, 0, 0, 0),
                    Ipv4Addr::new(127, 255, 255, 255),
                ),
                Ipv4Interface::new(
                    "eth0",
                    Ipv4Addr::new(10, 0, 0, 12),
                    Ipv4Addr::new(255, 255, 255, 0),
                    Ipv4Addr::new(10, 0, 0, 255),
                ),
            ],
            v6: vec![Ipv6Interface::new(
                "eth0",
                "fe80::1".parse().unwrap(),
                "ffff:ffff:ffff:ffff::".parse().unwrap(),
                Ipv6Addr::UNSPECIFIED,
            )],
        }
    }

    #[test]
    fn test_interface_list_preserves_family_order() {
        let list = sample();
        let mut out = Vec::new();
        list.encode(&mut out).unwrap();
        assert_eq!(out.len(), (16 + 2) + (16 + 4) + (52 + 4));

        let decoded = InterfaceList::decode(&out).unwrap();
        assert_eq!(decoded, list);
        assert_eq!(decoded.v4[1].address(), Ipv4Addr::new(10, 0, 0, 12));
        assert_eq!(decoded.v6[0].address(), "fe80::1".parse::<Ipv6Addr>().unwrap());
    }

    #[test]
    fn test_decode_skips_trailing_padding() {
        let mut out = Vec::new();
        sample().encode(&mut out).unwrap();
        out.extend_from_slice(&[0, 0]);
        assert_eq!(InterfaceList::decode(&out).unwrap().len(), 3);
    }

    #[test]
    fn test_name_overrunning_block_is_truncated() {
        let mut out = Vec::new();
        sample().encode(&mut out).unwrap();
        out.truncate(out.len() - 2);
        assert!(matches!(
            InterfaceList::decode(&out),
            Err(CaptureError::TruncatedRecord { what: "interface", .. })
        ));
    }

    #[test]
    fn test_unknown_interface_type() {
        let mut out = Vec::new();
        out.write_u16::<NativeEndian>(9).unwrap();
        out.write_u16::<NativeEndian>(0).unwrap();
        out.extend_from_slice(&[0u8; 12]);
        assert!(matches!(
            InterfaceList::decode(&out),
            Err(CaptureError::UnknownInterfaceType(9))
        ));
    }

    #[test]
    fn test_oversized_name_is_rejected() {
        let mut out = Vec::new();
        out.write_u16::<NativeEndian>(IFACE_TYPE_IPV4).unwrap();
        out.write_u16::<NativeEndian>(MAX_PATH_SIZE as u16).unwrap();
        out.extend_from_slice(&[0u8; 12]);
        out.extend_from_slice(&vec![b'x'; MAX_PATH_SIZE]);
        assert!(matches!(
            InterfaceList::decode(&out),
            Err(CaptureError::OversizedField { .. })
        ));
    }

    #[test]
    fn test_empty_list() {
        assert!(InterfaceList::decode(&[]).unwrap().is_empty());
    }
}
