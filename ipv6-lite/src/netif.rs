//! The layers the IPv6 pipeline hands packets to or asks questions of.
//!
//! None of them are implemented here: the device layer, the hook engine, the
//! neighbour table and the interface address table each live in their own
//! subsystem and are plugged into [`crate::Ipv6Option`].

use std::net::Ipv6Addr;

use crate::error::Result;
use crate::mbuf::Mbuf;

pub type PortId = u16;

/// A network device as seen by the IPv6 layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetDev {
    pub id: PortId,
    pub name: String,
    /// Link MTU; 0 when unknown.
    pub mtu: u32,
}

impl NetDev {
    pub fn new<S: Into<String>>(id: PortId, name: S, mtu: u32) -> Self {
        Self {
            id,
            name: name.into(),
            mtu,
        }
    }
}

/// The fixed points of the pipeline where filter and mangle callbacks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    PreRouting,
    LocalIn,
    Forward,
    LocalOut,
    PostRouting,
}

/// The decision of a hook chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every callback accepted; the pipeline continues with its next stage.
    Accept,
    /// A callback dropped the packet; the pipeline releases it.
    Drop,
}

/// The hook chain engine.
///
/// Callbacks may inspect and rewrite the packet. The engine reports the
/// outcome and the pipeline runs the follow-up stage itself on
/// [`Verdict::Accept`], so packet and route ownership never leave the
/// pipeline.
pub trait InetHooks: Send + Sync {
    fn run(
        &self,
        point: HookPoint,
        mbuf: &mut Mbuf,
        in_port: Option<PortId>,
        out_dev: Option<&NetDev>,
    ) -> Verdict;
}

/// A hook engine with no callbacks installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl InetHooks for NoHooks {
    fn run(&self, _: HookPoint, _: &mut Mbuf, _: Option<PortId>, _: Option<&NetDev>) -> Verdict {
        Verdict::Accept
    }
}

/// Neighbour resolution and link-layer transmission.
pub trait Neighbour: Send + Sync {
    /// Resolve `nexthop` on `dev` and transmit `mbuf`. The neighbour layer
    /// owns the buffer from here on, whatever the outcome.
    fn output(&self, nexthop: &Ipv6Addr, mbuf: Mbuf, dev: &NetDev) -> Result<()>;
}

/// The interface address table.
pub trait InetAddrs: Send + Sync {
    /// Check that `port` joined multicast `group`, optionally restricted to
    /// traffic from `src`.
    fn chk_mcast_addr(&self, port: PortId, group: &Ipv6Addr, src: Option<&Ipv6Addr>) -> bool;

    /// Pick a source address on `dev` for talking to `daddr` within `scope`.
    fn select_saddr(&self, dev: &NetDev, daddr: &Ipv6Addr, scope: u8) -> Option<Ipv6Addr>;
}

/// The device layer's ethertype dispatch table.
pub trait Netif: Send + Sync {
    fn register_pkt(&self, ether_type: u16) -> Result<()>;

    fn unregister_pkt(&self, ether_type: u16) -> Result<()>;
}

/// A device layer that needs no registration, e.g. when the caller feeds
/// [`crate::Ipv6::receive`] directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNetif;

impl Netif for NoNetif {
    fn register_pkt(&self, _: u16) -> Result<()> {
        Ok(())
    }

    fn unregister_pkt(&self, _: u16) -> Result<()> {
        Ok(())
    }
}

/// Extension header parsing that has to happen before the route lookup.
pub trait ExtHdrParser: Send + Sync {
    /// Validate the hop-by-hop options header that directly follows the fixed
    /// header at the front of `mbuf`.
    fn parse_hopopts(&self, mbuf: &mut Mbuf) -> Result<()>;
}
