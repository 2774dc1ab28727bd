//! IPv6 wire definitions: the fixed header view, address classification and
//! next-header values.

mod header;
pub use header::{prepend_header, Ipv6Header, IPV6_HEADER_LEN};

pub mod addr;

/// Minimum link MTU every IPv6 link must support (RFC 8200).
pub const IPV6_MIN_MTU: u32 = 1280;

/// Largest payload the 16-bit payload length field can describe.
pub const IPV6_MAXPLEN: usize = 65535;

/// Hop limit used when the caller does not pick one.
pub const INET_DEF_TTL: u8 = 64;

/// The ethertype of IPv6 frames.
pub const ETHER_TYPE_IPV6: u16 = 0x86dd;

enum_sim! {
    /// An enum-like type for the next-header values seen by the IPv6 layer.
    pub struct IpProtocol (u8) {
        /// Hop-by-hop options extension header.
        HOPOPTS = 0,

        TCP = 6,

        UDP = 17,

        /// Routing extension header.
        ROUTING = 43,

        /// Fragment extension header.
        FRAGMENT = 44,

        ESP = 50,

        AH = 51,

        ICMPV6 = 58,

        /// No next header.
        NONE = 59,

        /// Destination options extension header.
        DSTOPTS = 60,
    }
}
