//! IPv6 address classification (RFC 4291).

use std::net::Ipv6Addr;

flag_set! {
    /// The class bits of an IPv6 address, as computed by [`addr_type`].
    ///
    /// The unspecified address has no bits set at all.
    pub struct AddrType (u32) {
        UNICAST = 0x0001,
        MULTICAST = 0x0002,
        LOOPBACK = 0x0010,
        LINKLOCAL = 0x0020,
        SITELOCAL = 0x0040,
        COMPATV4 = 0x0080,
        MAPPED = 0x1000,
    }
}

/// Multicast scope: interface-local, usable for loopback only.
pub const SCOPE_NODELOCAL: u8 = 0x01;
pub const SCOPE_LINKLOCAL: u8 = 0x02;
pub const SCOPE_SITELOCAL: u8 = 0x05;
pub const SCOPE_GLOBAL: u8 = 0x0e;

/// Classify `addr`.
pub fn addr_type(addr: &Ipv6Addr) -> AddrType {
    let seg = addr.segments();
    let st = (u32::from(seg[0]) << 16) | u32::from(seg[1]);

    // 2000::/3 up to c000::/3 are all global unicast
    if (st & 0xe000_0000) != 0 && (st & 0xe000_0000) != 0xe000_0000 {
        return AddrType::UNICAST;
    }
    if (st & 0xff00_0000) == 0xff00_0000 {
        return AddrType::MULTICAST;
    }
    if (st & 0xffc0_0000) == 0xfe80_0000 {
        return AddrType::LINKLOCAL | AddrType::UNICAST;
    }
    if (st & 0xffc0_0000) == 0xfec0_0000 {
        return AddrType::SITELOCAL | AddrType::UNICAST;
    }
    if (st & 0xfe00_0000) == 0xfc00_0000 {
        // unique local addresses
        return AddrType::UNICAST;
    }

    if seg[..4].iter().all(|s| *s == 0) {
        if seg[4..6].iter().all(|s| *s == 0) {
            return match (seg[6], seg[7]) {
                (0, 0) => AddrType::EMPTY,
                (0, 1) => AddrType::LOOPBACK | AddrType::UNICAST,
                _ => AddrType::COMPATV4 | AddrType::UNICAST,
            };
        }
        if seg[4] == 0 && seg[5] == 0xffff {
            return AddrType::MAPPED;
        }
    }

    // reserved ranges are treated as unicast
    AddrType::UNICAST
}

/// The 4-bit scope field of a multicast address.
#[inline]
pub fn mc_scope(addr: &Ipv6Addr) -> u8 {
    addr.octets()[1] & 0x0f
}
