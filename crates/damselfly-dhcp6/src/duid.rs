//! DHCPv6 unique identifiers (RFC 8415 section 11).

use bytes::{Buf, BufMut, BytesMut};
use damselfly_common::MacAddr;

const DUID_TYPE_LLT: u16 = 1;
const DUID_TYPE_LL: u16 = 3;

/// IANA hardware type for Ethernet.
const HW_TYPE_ETHERNET: u16 = 1;

/// Our server identifier: a DUID-LL over the serving interface's Ethernet
/// address. Derived, never generated, so it survives restarts and clients
/// that cached it keep validating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuidLl {
    mac: MacAddr,
}

impl DuidLl {
    pub fn new(mac: MacAddr) -> Self {
        DuidLl { mac }
    }

    /// Wire form: duid-type, hardware type, link-layer address.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(10);
        buf.put_u16(DUID_TYPE_LL);
        buf.put_u16(HW_TYPE_ETHERNET);
        buf.put_slice(&self.mac.octets());
        buf.to_vec()
    }

    /// Byte-level equality against a client-supplied server ID.
    pub fn matches(&self, raw: &[u8]) -> bool {
        raw == self.to_bytes().as_slice()
    }
}

/// Recover the client's MAC from a raw DUID. Both link-layer forms are
/// accepted (DUID-LL and DUID-LLT) as long as the hardware type is Ethernet;
/// DUID-EN and DUID-UUID carry no MAC.
pub fn mac_from_duid(raw: &[u8]) -> Option<MacAddr> {
    let mut buf = raw;
    if buf.remaining() < 4 {
        return None;
    }
    let duid_type = buf.get_u16();
    let hw_type = buf.get_u16();
    if hw_type != HW_TYPE_ETHERNET {
        return None;
    }
    match duid_type {
        DUID_TYPE_LL => {}
        DUID_TYPE_LLT => {
            if buf.remaining() < 4 {
                return None;
            }
            buf.advance(4); // time field
        }
        _ => return None,
    }
    if buf.remaining() != 6 {
        return None;
    }
    let mut octets = [0u8; 6];
    buf.copy_to_slice(&mut octets);
    Some(MacAddr::new(octets))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac() -> MacAddr {
        "04:42:1a:03:9b:20".parse().unwrap()
    }

    #[test]
    fn test_duid_ll_wire_form() {
        let duid = DuidLl::new(mac());
        assert_eq!(
            duid.to_bytes(),
            vec![0x00, 0x03, 0x00, 0x01, 0x04, 0x42, 0x1a, 0x03, 0x9b, 0x20]
        );
    }

    #[test]
    fn test_matches_is_exact() {
        let duid = DuidLl::new(mac());
        assert!(duid.matches(&duid.to_bytes()));
        assert!(!duid.matches(&DuidLl::new("ff:ff:ff:ff:ff:ff".parse().unwrap()).to_bytes()));
        assert!(!duid.matches(&[]));
    }

    #[test]
    fn test_mac_from_duid_ll() {
        assert_eq!(mac_from_duid(&DuidLl::new(mac()).to_bytes()), Some(mac()));
    }

    #[test]
    fn test_mac_from_duid_llt() {
        let mut raw = vec![0x00, 0x01, 0x00, 0x01]; // DUID-LLT, Ethernet
        raw.extend_from_slice(&[0x2a, 0x4f, 0x11, 0x08]); // time
        raw.extend_from_slice(&mac().octets());
        assert_eq!(mac_from_duid(&raw), Some(mac()));
    }

    #[test]
    fn test_mac_from_duid_rejects_other_forms() {
        // DUID-EN: no link-layer address to recover
        assert_eq!(mac_from_duid(&[0x00, 0x02, 0x00, 0x00, 0x01, 0x37]), None);
        // non-Ethernet hardware type
        assert_eq!(
            mac_from_duid(&[0x00, 0x03, 0x00, 0x06, 1, 2, 3, 4, 5, 6]),
            None
        );
        // truncated
        assert_eq!(mac_from_duid(&[0x00, 0x03]), None);
        assert_eq!(mac_from_duid(&[0x00, 0x03, 0x00, 0x01, 1, 2, 3]), None);
    }
}
