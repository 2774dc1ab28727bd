use tracing::debug;

use crate::error::{Error, Result};
use crate::ipv6::addr::{addr_type, AddrType};
use crate::ipv6::Ipv6Header;
use crate::mbuf::EthPktType;
use crate::netif::HookPoint;
use crate::pkt::Pkt;
use crate::route::Route6;
use crate::stack::{Disposition, Ipv6};

impl Ipv6 {
    /// Decide whether a transit packet may leave again.
    pub(crate) fn forward(&self, mut pkt: Pkt<Route6>) -> Result<Disposition> {
        if !self.forwarding() {
            ip6_inc_stats!(in_addr_errors, in_discards);
            return self.forward_drop(pkt, Error::Policy("forwarding disabled"));
        }

        if pkt.mbuf.packet_type() != EthPktType::Host {
            ip6_inc_stats!(in_discards);
            return self.forward_drop(pkt, Error::Policy("frame not addressed to this host"));
        }

        let hdr = Ipv6Header::new_unchecked(pkt.mbuf.data());
        let saddr = hdr.src_addr();
        let hop_limit = hdr.hop_limit();

        if hdr.dst_addr().is_multicast() {
            ip6_inc_stats!(in_addr_errors, in_discards);
            return self.forward_drop(pkt, Error::Policy("multicast forwarding"));
        }

        // TODO: send ICMPv6 time exceeded once an ICMPv6 sender exists
        if hop_limit <= 1 {
            ip6_inc_stats!(in_hdr_errors, in_discards);
            return self.forward_drop(pkt, Error::HopLimitExceeded);
        }

        let ty = addr_type(&saddr);
        if ty.is_empty() || ty.intersects(AddrType::MULTICAST | AddrType::LOOPBACK) {
            ip6_inc_stats!(in_addr_errors, in_discards);
            return self.forward_drop(pkt, Error::Policy("bogus source address"));
        }
        if ty.contains(AddrType::LINKLOCAL) {
            ip6_inc_stats!(in_addr_errors, in_discards);
            return self.forward_drop(pkt, Error::Policy("link-local source address"));
        }

        let mtu = pkt.rt.mtu_forward();
        if pkt.mbuf.len() > mtu as usize {
            ip6_inc_stats!(in_too_big_errors, frag_fails, in_discards);
            return self.forward_drop(pkt, Error::TooBig(mtu));
        }

        Ipv6Header::new_unchecked(pkt.mbuf.data_mut()).set_hop_limit(hop_limit - 1);

        let in_port = pkt.mbuf.port();
        let dev = pkt.rt.dev().clone();
        self.inet_hook(
            HookPoint::Forward,
            pkt,
            Some(in_port),
            Some(&*dev),
            Self::forward_fin,
        )
    }

    fn forward_fin(&self, pkt: Pkt<Route6>) -> Result<Disposition> {
        ip6_inc_stats!(out_forw_datagrams);
        ip6_add_stats!(out_forw_octets, pkt.mbuf.len());

        self.output(pkt)
    }

    fn forward_drop(&self, pkt: Pkt<Route6>, err: Error) -> Result<Disposition> {
        debug!(port = pkt.mbuf.port(), "drop forwarded packet: {}", err);
        self.release(pkt);
        Err(err)
    }
}
