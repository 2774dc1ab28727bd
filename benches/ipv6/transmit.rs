use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ipv6_lite::ipv6::IpProtocol;
use ipv6_lite::netif::{InetAddrs, Neighbour};
use ipv6_lite::*;

use std::net::Ipv6Addr;
use std::sync::Arc;

struct OutRoutes(Arc<NetDev>);

impl RouteTable for OutRoutes {
    fn input(&self, _: &Mbuf, _: &Flow6) -> Option<Route6> {
        None
    }

    fn output(&self, _: &Mbuf, _: &Flow6) -> Option<Route6> {
        Some(
            Route6::new(RouteFlags::GATEWAY, self.0.clone())
                .with_gateway(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1)),
        )
    }

    fn put(&self, _: Route6) {}
}

struct Blackhole;

impl Neighbour for Blackhole {
    fn output(&self, _: &Ipv6Addr, mbuf: Mbuf, _: &NetDev) -> Result<()> {
        black_box(mbuf);
        Ok(())
    }
}

impl InetAddrs for Blackhole {
    fn chk_mcast_addr(&self, _: PortId, _: &Ipv6Addr, _: Option<&Ipv6Addr>) -> bool {
        false
    }

    fn select_saddr(&self, _: &NetDev, _: &Ipv6Addr, _: u8) -> Option<Ipv6Addr> {
        Some(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1))
    }
}

pub fn b(c: &mut Criterion) {
    let dev = Arc::new(NetDev::new(0, "dpdk0", 1500));
    let ipv6 = Ipv6Option::new(
        Arc::new(OutRoutes(dev)),
        Arc::new(Blackhole),
        Arc::new(Blackhole),
    )
    .build();

    let fl6 = Flow6 {
        daddr: Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 2),
        proto: IpProtocol::UDP,
        ..Default::default()
    };
    let payload = [0x5a; 200];

    c.bench_function("transmit_local", |b| {
        b.iter(|| {
            let res = ipv6.transmit_local(Mbuf::from_slice(black_box(&payload)), &fl6);
            assert!(matches!(res, Ok(Disposition::Transmitted)));
        })
    });
}

criterion_group!(benches, b);
criterion_main!(benches);
