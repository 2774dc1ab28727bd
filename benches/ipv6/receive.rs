use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ipv6_lite::ipv6::{IpProtocol, Ipv6Header};
use ipv6_lite::netif::{InetAddrs, Neighbour};
use ipv6_lite::*;

use std::net::Ipv6Addr;
use std::sync::Arc;

struct LocalRoutes(Arc<NetDev>);

impl RouteTable for LocalRoutes {
    fn input(&self, _: &Mbuf, _: &Flow6) -> Option<Route6> {
        Some(Route6::new(RouteFlags::LOCALIN, self.0.clone()))
    }

    fn output(&self, _: &Mbuf, _: &Flow6) -> Option<Route6> {
        None
    }

    fn put(&self, _: Route6) {}
}

struct Blackhole;

impl Neighbour for Blackhole {
    fn output(&self, _: &Ipv6Addr, _: Mbuf, _: &NetDev) -> Result<()> {
        Ok(())
    }
}

impl InetAddrs for Blackhole {
    fn chk_mcast_addr(&self, _: PortId, _: &Ipv6Addr, _: Option<&Ipv6Addr>) -> bool {
        false
    }

    fn select_saddr(&self, _: &NetDev, _: &Ipv6Addr, _: u8) -> Option<Ipv6Addr> {
        None
    }
}

struct Udp;

impl Inet6Protocol for Udp {
    fn handle(&self, mbuf: Mbuf) -> Result<Resubmit> {
        black_box(mbuf.data());
        Ok(Resubmit::Consumed)
    }

    fn is_final(&self) -> bool {
        true
    }
}

// fixed header, optionally a destination options header, then 64 bytes of udp
fn packet(dstopts: bool) -> Vec<u8> {
    let ext: &[u8] = if dstopts { &[17, 0, 1, 4, 0, 0, 0, 0] } else { &[] };
    let mut hdr = Ipv6Header::template();
    hdr.set_payload_len((ext.len() + 64) as u16);
    hdr.set_next_header(if dstopts { IpProtocol::DSTOPTS } else { IpProtocol::UDP });
    hdr.set_hop_limit(64);
    hdr.set_src_addr(&Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1));
    hdr.set_dst_addr(&Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 2));

    let mut buf = hdr.as_bytes().to_vec();
    buf.extend_from_slice(ext);
    buf.extend_from_slice(&[0x5a; 64]);
    buf
}

fn stack(dev: &Arc<NetDev>) -> Ipv6 {
    let ipv6 = Ipv6Option::new(
        Arc::new(LocalRoutes(dev.clone())),
        Arc::new(Blackhole),
        Arc::new(Blackhole),
    )
    .build();
    ipv6.init().unwrap();
    ipv6.register_protocol(Arc::new(Udp), IpProtocol::UDP).unwrap();
    ipv6
}

pub fn b(c: &mut Criterion) {
    let dev = Arc::new(NetDev::new(0, "dpdk0", 1500));
    let ipv6 = stack(&dev);

    for (name, dstopts) in [("receive_udp", false), ("receive_dstopts_udp", true)] {
        let pkt = packet(dstopts);
        c.bench_function(name, |b| {
            b.iter(|| {
                let res = ipv6.receive(Mbuf::from_slice(black_box(&pkt)), Some(dev.as_ref()));
                assert!(matches!(res, Ok(Disposition::Delivered)));
            })
        });
    }
}

criterion_group!(benches, b);
criterion_main!(benches);
