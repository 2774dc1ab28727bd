use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::conf::Ipv6Conf;
use crate::error::{Error, Result};
use crate::exthdrs::Ipv6ExtHdrs;
use crate::ipv6::{IpProtocol, ETHER_TYPE_IPV6, IPV6_HEADER_LEN};
use crate::mbuf::{Mbuf, PktBuf};
use crate::netif::{
    ExtHdrParser, HookPoint, InetAddrs, InetHooks, NetDev, Neighbour, Netif, NoHooks, NoNetif,
    PortId, Verdict,
};
use crate::pkt::{Pkt, RouteSlot};
use crate::protocol::{Inet6Protocol, ProtoRegistry};
use crate::route::RouteTable;
use crate::stats::{self, InetStats};

/// How the pipeline disposed of a packet it did not reject.
#[derive(Debug)]
pub enum Disposition {
    /// An upper-layer protocol consumed the packet.
    Delivered,
    /// The packet was handed to the neighbour layer.
    Transmitted,
    /// The fast path does not handle this packet. The buffer is returned,
    /// starting at the IPv6 fixed header, so the caller can pass it to the
    /// slow path.
    Fallback(Mbuf),
    /// A hook callback dropped the packet.
    Filtered(HookPoint),
}

/// Collects the collaborators of an [`Ipv6`] instance.
///
/// The route table, the neighbour layer and the address table are mandatory.
/// Everything else has a default: an empty hook engine, a device layer that
/// needs no registration, a private protocol registry and the built-in
/// hop-by-hop parser.
///
/// # Examples
///
/// ```ignore
/// let ipv6 = Ipv6Option::new(routes, neigh, addrs)
///     .conf(Ipv6Conf::from_keywords("forwarding on"))
///     .hooks(firewall)
///     .build();
/// ipv6.init()?;
/// ```
pub struct Ipv6Option {
    conf: Ipv6Conf,
    prots: Option<Arc<ProtoRegistry>>,
    routes: Arc<dyn RouteTable>,
    neigh: Arc<dyn Neighbour>,
    addrs: Arc<dyn InetAddrs>,
    hooks: Arc<dyn InetHooks>,
    netif: Arc<dyn Netif>,
    hopopts: Option<Arc<dyn ExtHdrParser>>,
}

impl Ipv6Option {
    pub fn new(
        routes: Arc<dyn RouteTable>,
        neigh: Arc<dyn Neighbour>,
        addrs: Arc<dyn InetAddrs>,
    ) -> Self {
        Self {
            conf: Ipv6Conf::default(),
            prots: None,
            routes,
            neigh,
            addrs,
            hooks: Arc::new(NoHooks),
            netif: Arc::new(NoNetif),
            hopopts: None,
        }
    }

    pub fn conf(&mut self, conf: Ipv6Conf) -> &mut Self {
        self.conf = conf;
        self
    }

    /// Share a protocol registry between several instances, e.g. one per
    /// worker.
    pub fn registry(&mut self, prots: Arc<ProtoRegistry>) -> &mut Self {
        self.prots = Some(prots);
        self
    }

    pub fn hooks(&mut self, hooks: Arc<dyn InetHooks>) -> &mut Self {
        self.hooks = hooks;
        self
    }

    pub fn netif(&mut self, netif: Arc<dyn Netif>) -> &mut Self {
        self.netif = netif;
        self
    }

    pub fn hopopts_parser(&mut self, parser: Arc<dyn ExtHdrParser>) -> &mut Self {
        self.hopopts = Some(parser);
        self
    }

    pub fn build(&self) -> Ipv6 {
        let hopopts: Arc<dyn ExtHdrParser> = match &self.hopopts {
            Some(parser) => parser.clone(),
            None => Arc::new(Ipv6ExtHdrs::new()),
        };
        Ipv6 {
            forwarding: AtomicBool::new(self.conf.forwarding),
            disable: AtomicBool::new(self.conf.disable),
            prots: self
                .prots
                .clone()
                .unwrap_or_else(|| Arc::new(ProtoRegistry::new())),
            exthdrs: Ipv6ExtHdrs::new(),
            hopopts,
            routes: self.routes.clone(),
            neigh: self.neigh.clone(),
            addrs: self.addrs.clone(),
            hooks: self.hooks.clone(),
            netif: self.netif.clone(),
        }
    }
}

impl fmt::Debug for Ipv6Option {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ipv6Option")
            .field("conf", &self.conf)
            .field("prots", &self.prots)
            .finish_non_exhaustive()
    }
}

/// The IPv6 layer.
///
/// One instance can be shared by all workers: the packet path only reads the
/// two configuration switches and takes the registry read lock, and the
/// counters live in the worker's own [`InetStats`] block.
pub struct Ipv6 {
    forwarding: AtomicBool,
    disable: AtomicBool,
    pub(crate) prots: Arc<ProtoRegistry>,
    exthdrs: Ipv6ExtHdrs,
    pub(crate) hopopts: Arc<dyn ExtHdrParser>,
    pub(crate) routes: Arc<dyn RouteTable>,
    pub(crate) neigh: Arc<dyn Neighbour>,
    pub(crate) addrs: Arc<dyn InetAddrs>,
    hooks: Arc<dyn InetHooks>,
    netif: Arc<dyn Netif>,
}

impl Ipv6 {
    /// Install the built-in extension header handlers and register the IPv6
    /// ethertype with the device layer.
    pub fn init(&self) -> Result<()> {
        self.exthdrs.init(&self.prots)?;

        if let Err(err) = self.netif.register_pkt(ETHER_TYPE_IPV6) {
            self.exthdrs.term(&self.prots);
            return Err(err);
        }

        info!(
            forwarding = self.forwarding(),
            disable = self.disabled(),
            "ipv6 initialized"
        );
        Ok(())
    }

    /// Undo [`Ipv6::init`].
    pub fn terminate(&self) -> Result<()> {
        self.netif.unregister_pkt(ETHER_TYPE_IPV6)?;
        self.exthdrs.term(&self.prots);

        info!("ipv6 terminated");
        Ok(())
    }

    pub fn register_protocol(
        &self,
        prot: Arc<dyn Inet6Protocol>,
        protocol: IpProtocol,
    ) -> Result<()> {
        self.prots.register(prot, protocol)
    }

    pub fn unregister_protocol(
        &self,
        prot: &Arc<dyn Inet6Protocol>,
        protocol: IpProtocol,
    ) -> Result<()> {
        self.prots.unregister(prot, protocol)
    }

    pub fn registry(&self) -> &Arc<ProtoRegistry> {
        &self.prots
    }

    /// The counters of the calling worker.
    pub fn read_local_stats(&self) -> InetStats {
        stats::read_local_stats()
    }

    #[inline]
    pub fn forwarding(&self) -> bool {
        self.forwarding.load(Ordering::Relaxed)
    }

    pub fn set_forwarding(&self, on: bool) {
        self.forwarding.store(on, Ordering::Relaxed);
    }

    #[inline]
    pub fn disabled(&self) -> bool {
        self.disable.load(Ordering::Relaxed)
    }

    pub fn set_disable(&self, on: bool) {
        self.disable.store(on, Ordering::Relaxed);
    }

    pub fn conf(&self) -> Ipv6Conf {
        Ipv6Conf {
            forwarding: self.forwarding(),
            disable: self.disabled(),
        }
    }

    /// Run the hook chain at `point` and continue with `okfn` if every
    /// callback accepts. A dropped packet is released here.
    ///
    /// The finalizers read the fixed header in place, so an accepted packet
    /// that a callback cut below 40 bytes is discarded as malformed.
    pub(crate) fn inet_hook<R: RouteSlot>(
        &self,
        point: HookPoint,
        mut pkt: Pkt<R>,
        in_port: Option<PortId>,
        out_dev: Option<&NetDev>,
        okfn: fn(&Self, Pkt<R>) -> Result<Disposition>,
    ) -> Result<Disposition> {
        match self.hooks.run(point, &mut pkt.mbuf, in_port, out_dev) {
            Verdict::Accept if pkt.mbuf.len() < IPV6_HEADER_LEN => {
                match point {
                    HookPoint::LocalOut | HookPoint::PostRouting => ip6_inc_stats!(out_discards),
                    _ => ip6_inc_stats!(in_hdr_errors, in_discards),
                }
                debug!(?point, len = pkt.mbuf.len(), "hook left no ipv6 header");
                self.release(pkt);
                Err(Error::Malformed("hook truncated the fixed header"))
            }
            Verdict::Accept => okfn(self, pkt),
            Verdict::Drop => {
                trace!(?point, "packet dropped by hook");
                self.release(pkt);
                Ok(Disposition::Filtered(point))
            }
        }
    }

    /// Give the packet up to the slow path, rewound to its fixed header.
    pub(crate) fn fallback<R: RouteSlot>(&self, pkt: Pkt<R>) -> Disposition {
        let mut mbuf = pkt.into_mbuf(self.routes.as_ref());
        let consumed = mbuf.network_header_consumed();
        if consumed > 0 {
            mbuf.move_back(consumed);
        }
        Disposition::Fallback(mbuf)
    }

    /// Release the route slot and free the buffer.
    #[inline]
    pub(crate) fn release<R: RouteSlot>(&self, pkt: Pkt<R>) {
        drop(pkt.into_mbuf(self.routes.as_ref()));
    }
}

impl fmt::Debug for Ipv6 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ipv6")
            .field("conf", &self.conf())
            .field("prots", &self.prots)
            .field("exthdrs", &self.exthdrs)
            .finish_non_exhaustive()
    }
}
