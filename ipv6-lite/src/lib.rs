#![warn(rust_2018_idioms)]

//! The IPv6 layer of a userspace forwarding plane.
//!
//! Packets enter through [`Ipv6::receive`], get validated, run through the
//! pre-routing hooks and a route lookup, and are then either delivered to a
//! registered upper-layer protocol, forwarded, or handed back to the caller
//! for the slow path. Locally generated packets enter through
//! [`Ipv6::transmit_local`] and share the same output path.

#[macro_use]
mod macros;

#[macro_use]
pub mod stats;
pub use stats::{read_local_stats, InetStats};

pub mod error;
pub use error::{Error, ErrorKind, Result};

mod mbuf;
pub use mbuf::{Buf, EthPktType, Mbuf, PktBuf, PktBufMut, MBUF_HEADROOM};

pub mod ipv6;

pub mod netif;
pub use netif::{HookPoint, NetDev, PortId, Verdict};

pub mod route;
pub use route::{Flow6, Route6, RouteFlags, RouteTable};

pub mod protocol;
pub use protocol::{Inet6Protocol, ProtoRegistry, Resubmit};

pub mod exthdrs;

pub mod conf;
pub use conf::Ipv6Conf;

mod pkt;

mod forward;
mod input;
mod output;

mod stack;
pub use stack::{Disposition, Ipv6, Ipv6Option};
