use std::net::Ipv6Addr;
use std::sync::Arc;

use crate::ipv6::{IpProtocol, IPV6_MIN_MTU};
use crate::mbuf::Mbuf;
use crate::netif::{NetDev, PortId};

flag_set! {
    /// Route flags consulted by the pipeline.
    pub struct RouteFlags (u32) {
        /// Deliver to this host.
        LOCALIN = 0x0400,
        /// Forward towards another host.
        FORWARD = 0x0800,
        /// The next hop is `gateway` rather than the destination itself.
        GATEWAY = 0x0002,
    }
}

/// A resolved route, referenced by exactly one packet.
///
/// The type is neither `Clone` nor `Copy`: the only way to get rid of a route
/// is to hand it back with [`RouteTable::put`], so it is released exactly
/// once.
#[derive(Debug)]
pub struct Route6 {
    flags: RouteFlags,
    gateway: Ipv6Addr,
    mtu: u32,
    dev: Arc<NetDev>,
}

impl Route6 {
    pub fn new(flags: RouteFlags, dev: Arc<NetDev>) -> Self {
        Self {
            flags,
            gateway: Ipv6Addr::UNSPECIFIED,
            mtu: 0,
            dev,
        }
    }

    pub fn with_gateway(mut self, gateway: Ipv6Addr) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn with_mtu(mut self, mtu: u32) -> Self {
        self.mtu = mtu;
        self
    }

    #[inline]
    pub fn flags(&self) -> RouteFlags {
        self.flags
    }

    #[inline]
    pub fn gateway(&self) -> &Ipv6Addr {
        &self.gateway
    }

    /// The route MTU; 0 when the route does not carry one.
    #[inline]
    pub fn mtu(&self) -> u32 {
        self.mtu
    }

    #[inline]
    pub fn dev(&self) -> &Arc<NetDev> {
        &self.dev
    }

    /// The address to resolve on the link: the gateway if the route has a
    /// usable one, `daddr` otherwise.
    #[inline]
    pub fn nexthop(&self, daddr: &Ipv6Addr) -> Ipv6Addr {
        if self.flags.contains(RouteFlags::GATEWAY) && !self.gateway.is_unspecified() {
            self.gateway
        } else {
            *daddr
        }
    }

    /// The MTU packets on this route must fit in: the route MTU, else the
    /// device MTU, never less than the IPv6 minimum.
    #[inline]
    pub fn mtu_forward(&self) -> u32 {
        let mtu = if self.mtu != 0 {
            self.mtu
        } else if self.dev.mtu != 0 {
            self.dev.mtu
        } else {
            IPV6_MIN_MTU
        };
        mtu.max(IPV6_MIN_MTU)
    }

    /// The MTU the output path fragments at: the route MTU as configured,
    /// else the device MTU.
    #[inline]
    pub fn mtu_output(&self) -> u32 {
        if self.mtu != 0 {
            self.mtu
        } else if self.dev.mtu != 0 {
            self.dev.mtu
        } else {
            IPV6_MIN_MTU
        }
    }
}

/// The lookup key of a route query, and the description of a locally
/// generated packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flow6 {
    pub iif: Option<PortId>,
    pub oif: Option<PortId>,
    pub daddr: Ipv6Addr,
    pub saddr: Ipv6Addr,
    pub proto: IpProtocol,
    /// Traffic class.
    pub tos: u8,
    /// 20-bit flow label.
    pub flow_label: u32,
    /// Hop limit; 0 selects the default.
    pub ttl: u8,
    pub scope: u8,
}

impl Default for Flow6 {
    fn default() -> Self {
        Self {
            iif: None,
            oif: None,
            daddr: Ipv6Addr::UNSPECIFIED,
            saddr: Ipv6Addr::UNSPECIFIED,
            proto: IpProtocol::NONE,
            tos: 0,
            flow_label: 0,
            ttl: 0,
            scope: 0,
        }
    }
}

/// The route lookup subsystem.
pub trait RouteTable: Send + Sync {
    /// Route a received packet.
    fn input(&self, mbuf: &Mbuf, fl6: &Flow6) -> Option<Route6>;

    /// Route a locally generated packet.
    fn output(&self, mbuf: &Mbuf, fl6: &Flow6) -> Option<Route6>;

    /// Release a route obtained from [`RouteTable::input`] or
    /// [`RouteTable::output`].
    fn put(&self, rt: Route6);
}
