//! The transmit side, shared by forwarded and locally generated packets.

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::ipv6::addr::{mc_scope, SCOPE_NODELOCAL};
use crate::ipv6::{
    prepend_header, IpProtocol, Ipv6Header, ETHER_TYPE_IPV6, INET_DEF_TTL, IPV6_MAXPLEN,
};
use crate::mbuf::Mbuf;
use crate::netif::HookPoint;
use crate::pkt::Pkt;
use crate::route::{Flow6, Route6};
use crate::stack::{Disposition, Ipv6};

impl Ipv6 {
    /// Send a locally generated packet.
    ///
    /// `mbuf` holds the upper-layer payload; the fixed header is built from
    /// `fl6` and prepended into the headroom. An unspecified source address is
    /// replaced by one selected on the egress device, except for ICMPv6 whose
    /// callers pick their own.
    pub fn transmit_local(&self, mut mbuf: Mbuf, fl6: &Flow6) -> Result<Disposition> {
        if fl6.daddr.is_unspecified() {
            ip6_inc_stats!(out_discards);
            return Err(Error::InvalidArgument("unspecified destination"));
        }

        if mbuf.len() > IPV6_MAXPLEN {
            ip6_inc_stats!(out_discards);
            debug!(len = mbuf.len(), "drop oversized local packet");
            return Err(Error::NoRoom("payload exceeds maximum length"));
        }

        let Some(rt) = self.routes.output(&mbuf, fl6) else {
            ip6_inc_stats!(out_no_routes);
            debug!(daddr = %fl6.daddr, "no output route");
            return Err(Error::NoRoute);
        };

        let mut hdr = Ipv6Header::template();
        hdr.set_traffic_class(fl6.tos);
        hdr.set_flow_label(fl6.flow_label & 0x000f_ffff);
        hdr.set_next_header(fl6.proto);
        hdr.set_hop_limit(if fl6.ttl != 0 { fl6.ttl } else { INET_DEF_TTL });
        hdr.set_src_addr(&fl6.saddr);
        hdr.set_dst_addr(&fl6.daddr);

        if fl6.saddr.is_unspecified() && fl6.proto != IpProtocol::ICMPV6 {
            match self.addrs.select_saddr(rt.dev(), &fl6.daddr, fl6.scope) {
                Some(saddr) => hdr.set_src_addr(&saddr),
                None => debug!(daddr = %fl6.daddr, dev = %rt.dev().name, "no source address"),
            }
        }

        if !prepend_header(&mut mbuf, &hdr) {
            self.routes.put(rt);
            ip6_inc_stats!(out_discards);
            debug!(headroom = mbuf.front_capacity(), "no room for ipv6 header");
            return Err(Error::NoRoom("headroom too small for ipv6 header"));
        }
        mbuf.mark_network_header();

        self.local_out(Pkt::new(mbuf).with_route(rt))
    }

    fn local_out(&self, pkt: Pkt<Route6>) -> Result<Disposition> {
        let dev = pkt.rt.dev().clone();
        self.inet_hook(HookPoint::LocalOut, pkt, None, Some(&*dev), Self::output)
    }

    pub(crate) fn output(&self, mut pkt: Pkt<Route6>) -> Result<Disposition> {
        ip6_upd_po_stats!(out_pkts, out_octets, pkt.mbuf.len());
        let dev = pkt.rt.dev().clone();
        pkt.mbuf.set_port(dev.id);

        if self.disabled() {
            ip6_inc_stats!(out_discards);
            self.release(pkt);
            return Err(Error::Disabled);
        }

        self.inet_hook(
            HookPoint::PostRouting,
            pkt,
            None,
            Some(&*dev),
            Self::output_fin,
        )
    }

    fn output_fin(&self, pkt: Pkt<Route6>) -> Result<Disposition> {
        let mtu = pkt.rt.mtu_output();
        if pkt.mbuf.len() > mtu as usize {
            self.fragment(pkt, mtu)
        } else {
            self.output_fin2(pkt)
        }
    }

    // TODO: split into mtu sized fragments, each holding its own route
    fn fragment(&self, pkt: Pkt<Route6>, mtu: u32) -> Result<Disposition> {
        ip6_inc_stats!(frag_fails);
        debug!(len = pkt.mbuf.len(), mtu, "fragmentation not supported");
        self.release(pkt);
        Err(Error::Frag)
    }

    fn output_fin2(&self, pkt: Pkt<Route6>) -> Result<Disposition> {
        let Pkt { mut mbuf, rt } = pkt;
        let daddr = Ipv6Header::new_unchecked(mbuf.data()).dst_addr();

        if daddr.is_multicast() {
            ip6_upd_po_stats!(out_mcast_pkts, out_mcast_octets, mbuf.len());

            if mc_scope(&daddr) <= SCOPE_NODELOCAL {
                ip6_inc_stats!(out_discards);
                debug!(%daddr, "drop interface-local multicast on output");
                self.routes.put(rt);
                return Err(Error::Policy("interface-local multicast"));
            }
        }

        let nexthop = rt.nexthop(&daddr);
        mbuf.set_ether_type(ETHER_TYPE_IPV6);
        trace!(%nexthop, dev = %rt.dev().name, "transmit");

        let res = self.neigh.output(&nexthop, mbuf, rt.dev());
        self.routes.put(rt);
        res.map(|_| Disposition::Transmitted)
    }
}
