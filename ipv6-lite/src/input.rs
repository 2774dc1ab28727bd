//! The receive side: header validation, route dispatch and local delivery.

use tracing::{debug, error, trace};

use crate::error::{Error, Result};
use crate::ipv6::addr::{mc_scope, SCOPE_NODELOCAL};
use crate::ipv6::{IpProtocol, Ipv6Header, IPV6_HEADER_LEN};
use crate::mbuf::{EthPktType, Mbuf, PktBuf};
use crate::netif::{HookPoint, NetDev};
use crate::pkt::Pkt;
use crate::protocol::Resubmit;
use crate::route::{Flow6, Route6, RouteFlags};
use crate::stack::{Disposition, Ipv6};

/// Upper bound of handler invocations for one packet.
pub(crate) const MAX_RESUBMIT: usize = 32;

/// The checks on the fixed header that do not depend on the payload length.
fn check_header(mbuf: &Mbuf, etype: EthPktType) -> Result<()> {
    if !mbuf.may_pull(IPV6_HEADER_LEN) {
        return Err(Error::Malformed("shorter than the fixed header"));
    }
    let hdr = Ipv6Header::new_unchecked(mbuf.data());

    if hdr.version() != 6 {
        return Err(Error::Malformed("bad version"));
    }

    let saddr = hdr.src_addr();
    let daddr = hdr.dst_addr();

    // there is no loopback device, so loopback addresses on the wire are forged
    if saddr.is_loopback() || daddr.is_loopback() {
        return Err(Error::Policy("loopback address"));
    }

    let mcast = daddr.is_multicast();

    // RFC 4291 errata 3480: interface-local scope only makes sense on loopback
    if mcast && mc_scope(&daddr) == SCOPE_NODELOCAL {
        return Err(Error::Policy("interface-local multicast"));
    }

    // RFC 4291 2.7: a unicast address must not arrive in a link-layer
    // multicast or broadcast frame
    if !mcast && matches!(etype, EthPktType::Broadcast | EthPktType::Multicast) {
        return Err(Error::Policy("unicast in link-layer multicast"));
    }

    // RFC 4291 2.7: scope 0 is reserved
    if mcast && mc_scope(&daddr) == 0 {
        return Err(Error::Malformed("reserved multicast scope"));
    }

    // RFC 4291 2.7: multicast addresses must not be used as source
    if saddr.is_multicast() {
        return Err(Error::Policy("multicast source"));
    }

    Ok(())
}

impl Ipv6 {
    /// The link-layer entry point.
    ///
    /// `mbuf` must start at the IPv6 fixed header and carry the link-layer
    /// class set by the device layer. `dev` is the ingress device.
    pub fn receive(&self, mut mbuf: Mbuf, dev: Option<&NetDev>) -> Result<Disposition> {
        let etype = mbuf.packet_type();
        let dev = match dev {
            Some(dev) if etype != EthPktType::OtherHost => dev,
            _ => {
                ip6_inc_stats!(in_discards);
                trace!(?etype, "drop frame not addressed to this host");
                return Err(Error::Policy("frame not addressed to this host"));
            }
        };

        ip6_upd_po_stats!(in_pkts, in_octets, mbuf.len());

        if self.disabled() {
            ip6_inc_stats!(in_discards);
            return Err(Error::Disabled);
        }

        if let Err(err) = check_header(&mbuf, etype) {
            ip6_inc_stats!(in_hdr_errors, in_discards);
            debug!(port = dev.id, "drop ipv6 packet: {}", err);
            return Err(err);
        }

        let hdr = Ipv6Header::new_unchecked(mbuf.data());
        let nexthdr = hdr.next_header();
        let pkt_len = usize::from(hdr.payload_len());

        // a zero payload length in front of hop-by-hop options announces a
        // jumbogram, which the hop-by-hop parser rejects
        if pkt_len != 0 || nexthdr != IpProtocol::HOPOPTS {
            let tot_len = IPV6_HEADER_LEN + pkt_len;
            if tot_len > mbuf.len() {
                ip6_inc_stats!(in_truncated_pkts, in_discards);
                debug!(port = dev.id, tot_len, len = mbuf.len(), "drop truncated ipv6 packet");
                return Err(Error::Malformed("truncated packet"));
            }
            // strip link-layer padding
            let pad = mbuf.len() - tot_len;
            if pad > 0 {
                mbuf.trim_off(pad);
            }
        }

        mbuf.set_l3_len(IPV6_HEADER_LEN);
        mbuf.set_port(dev.id);
        mbuf.mark_network_header();

        if nexthdr == IpProtocol::HOPOPTS {
            if let Err(err) = self.hopopts.parse_hopopts(&mut mbuf) {
                ip6_inc_stats!(in_hdr_errors, in_discards);
                debug!(port = dev.id, "drop ipv6 packet: {}", err);
                return Err(err);
            }
        }

        self.inet_hook(
            HookPoint::PreRouting,
            Pkt::new(mbuf),
            Some(dev.id),
            None,
            Self::rcv_fin,
        )
    }

    fn rcv_fin(&self, pkt: Pkt) -> Result<Disposition> {
        let hdr = Ipv6Header::new_unchecked(pkt.mbuf.data());
        let fl6 = Flow6 {
            iif: Some(pkt.mbuf.port()),
            daddr: hdr.dst_addr(),
            saddr: hdr.src_addr(),
            proto: hdr.next_header(),
            ..Default::default()
        };

        let Some(rt) = self.routes.input(&pkt.mbuf, &fl6) else {
            ip6_inc_stats!(in_no_routes);
            trace!(daddr = %fl6.daddr, "no input route");
            return Ok(self.fallback(pkt));
        };
        let pkt = pkt.with_route(rt);
        let flags = pkt.rt.flags();

        if flags.contains(RouteFlags::LOCALIN) {
            self.local_in(pkt)
        } else if fl6.daddr.is_multicast() {
            self.mc_local_in(pkt)
        } else if flags.contains(RouteFlags::FORWARD) {
            // link-layer multicast and broadcast are never forwarded
            if pkt.mbuf.packet_type() != EthPktType::Host {
                return Ok(self.fallback(pkt));
            }
            self.forward(pkt)
        } else {
            ip6_inc_stats!(in_no_routes);
            trace!(daddr = %fl6.daddr, flags = flags.bits(), "route neither local nor forwarding");
            Ok(self.fallback(pkt))
        }
    }

    fn mc_local_in(&self, pkt: Pkt<Route6>) -> Result<Disposition> {
        ip6_upd_po_stats!(in_mcast_pkts, in_mcast_octets, pkt.mbuf.len());

        let daddr = Ipv6Header::new_unchecked(pkt.mbuf.data()).dst_addr();
        if self.addrs.chk_mcast_addr(pkt.mbuf.port(), &daddr, None) {
            self.local_in(pkt)
        } else {
            trace!(%daddr, port = pkt.mbuf.port(), "not a member of the group");
            Ok(self.fallback(pkt))
        }
    }

    fn local_in(&self, pkt: Pkt<Route6>) -> Result<Disposition> {
        let port = pkt.mbuf.port();
        self.inet_hook(
            HookPoint::LocalIn,
            pkt,
            Some(port),
            None,
            Self::local_in_fin,
        )
    }

    /// Walk the next-header chain, handing each header to its registered
    /// protocol until one consumes the packet.
    fn local_in_fin(&self, pkt: Pkt<Route6>) -> Result<Disposition> {
        // local delivery has no use for the route
        let mut mbuf = pkt.into_mbuf(self.routes.as_ref());

        let (saddr, daddr, mut nexthdr) = match Ipv6Header::new(mbuf.network_header()) {
            Ok(hdr) => (hdr.src_addr(), hdr.dst_addr(), hdr.next_header()),
            Err(_) => {
                ip6_inc_stats!(in_hdr_errors, in_discards);
                debug!(len = mbuf.len(), "drop packet without a network header");
                return Err(Error::Malformed("network header lost"));
            }
        };
        let mut have_final = false;
        // a final protocol hands back the next header without leaving a
        // header behind for the dispatcher to consume
        let mut advance = true;

        for _ in 0..MAX_RESUBMIT {
            if advance && !mbuf.adj(mbuf.l3_len()) {
                ip6_inc_stats!(in_discards);
                debug!(
                    l3_len = mbuf.l3_len(),
                    len = mbuf.len(),
                    "drop truncated extension header chain"
                );
                return Err(Error::Malformed("truncated extension header chain"));
            }

            let Some(prot) = self.prots.lookup(nexthdr) else {
                ip6_inc_stats!(in_unknown_protos);
                trace!(nexthdr = nexthdr.raw(), "no protocol registered");
                return Ok(self.fallback(Pkt::new(mbuf)));
            };

            let is_final = prot.is_final();
            if have_final {
                if !is_final {
                    ip6_inc_stats!(in_discards);
                    debug!(nexthdr = nexthdr.raw(), "drop non-final header after final protocol");
                    return Err(Error::Malformed("extension header after final protocol"));
                }
            } else if is_final {
                have_final = true;
                if daddr.is_multicast()
                    && !self.addrs.chk_mcast_addr(mbuf.port(), &daddr, Some(&saddr))
                {
                    trace!(%daddr, %saddr, port = mbuf.port(), "multicast not accepted");
                    return Ok(self.fallback(Pkt::new(mbuf)));
                }
            }

            match prot.handle(mbuf) {
                Ok(Resubmit::Next(next, buf)) => {
                    nexthdr = next;
                    advance = !is_final;
                    mbuf = buf;
                }
                Ok(Resubmit::Consumed) => {
                    ip6_inc_stats!(in_delivers);
                    return Ok(Disposition::Delivered);
                }
                Err(err) => {
                    ip6_inc_stats!(in_discards);
                    debug!(nexthdr = nexthdr.raw(), "protocol dropped packet: {}", err);
                    return Err(err);
                }
            }
        }

        ip6_inc_stats!(in_discards);
        error!(
            limit = MAX_RESUBMIT,
            nexthdr = nexthdr.raw(),
            "extension header chain too long"
        );
        Err(Error::Malformed("extension header chain too long"))
    }
}
