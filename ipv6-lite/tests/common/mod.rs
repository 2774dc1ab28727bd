#![allow(dead_code)]

use std::net::Ipv6Addr;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ipv6_lite::ipv6::IpProtocol;
use ipv6_lite::netif::{InetAddrs, InetHooks, Neighbour, Netif};
use ipv6_lite::*;
use smoltcp::wire::{IpProtocol as WireProtocol, Ipv6Address, Ipv6Packet, Ipv6Repr};

pub fn addr(s: &str) -> Ipv6Addr {
    Ipv6Addr::from_str(s).unwrap()
}

pub fn hex_to_packet(content: &str) -> Vec<u8> {
    let content: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    (0..content.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&content[i..i + 2], 16).unwrap())
        .collect()
}

/// Builds IPv6 packets with smoltcp's wire module.
pub struct PacketBuilder {
    src: Ipv6Addr,
    dst: Ipv6Addr,
    next_header: IpProtocol,
    hop_limit: u8,
    exts: Vec<u8>,
    payload: Vec<u8>,
    pad: usize,
    packet_type: EthPktType,
}

impl PacketBuilder {
    pub fn new(src: &str, dst: &str) -> Self {
        Self {
            src: addr(src),
            dst: addr(dst),
            next_header: IpProtocol::UDP,
            hop_limit: 64,
            exts: Vec::new(),
            payload: vec![0xab; 16],
            pad: 0,
            packet_type: EthPktType::Host,
        }
    }

    pub fn next_header(mut self, nh: IpProtocol) -> Self {
        self.next_header = nh;
        self
    }

    pub fn hop_limit(mut self, hop_limit: u8) -> Self {
        self.hop_limit = hop_limit;
        self
    }

    /// Append an options header (hop-by-hop or destination options) carrying
    /// `next` and `opts`, padded with PadN to a multiple of 8 bytes.
    pub fn options(mut self, next: IpProtocol, opts: &[u8]) -> Self {
        let mut hdr = vec![next.raw(), 0];
        hdr.extend_from_slice(opts);
        let pad = (8 - hdr.len() % 8) % 8;
        match pad {
            0 => {}
            1 => hdr.push(0),
            n => {
                hdr.push(1);
                hdr.push((n - 2) as u8);
                hdr.extend(std::iter::repeat(0).take(n - 2));
            }
        }
        hdr[1] = (hdr.len() / 8 - 1) as u8;
        self.exts.extend_from_slice(&hdr);
        self
    }

    pub fn payload(mut self, payload: &[u8]) -> Self {
        self.payload = payload.to_vec();
        self
    }

    /// Trailing link-layer padding not covered by the payload length.
    pub fn pad(mut self, pad: usize) -> Self {
        self.pad = pad;
        self
    }

    pub fn packet_type(mut self, packet_type: EthPktType) -> Self {
        self.packet_type = packet_type;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let payload_len = self.exts.len() + self.payload.len();
        let mut buf = vec![0; 40 + payload_len + self.pad];

        let repr = Ipv6Repr {
            src_addr: Ipv6Address::from(self.src),
            dst_addr: Ipv6Address::from(self.dst),
            next_header: WireProtocol::from(self.next_header.raw()),
            payload_len,
            hop_limit: self.hop_limit,
        };
        repr.emit(&mut Ipv6Packet::new_unchecked(&mut buf[..]));

        buf[40..40 + self.exts.len()].copy_from_slice(&self.exts);
        buf[40 + self.exts.len()..40 + payload_len].copy_from_slice(&self.payload);
        buf
    }

    pub fn mbuf(&self) -> Mbuf {
        let mut mbuf = Mbuf::from_slice(&self.build());
        mbuf.set_packet_type(self.packet_type);
        mbuf
    }
}

#[derive(Debug, Clone)]
pub struct RouteSpec {
    pub flags: RouteFlags,
    pub dev: Arc<NetDev>,
    pub gateway: Option<Ipv6Addr>,
    pub mtu: u32,
}

impl RouteSpec {
    pub fn new(flags: RouteFlags, dev: &Arc<NetDev>) -> Self {
        Self {
            flags,
            dev: dev.clone(),
            gateway: None,
            mtu: 0,
        }
    }

    fn make(&self) -> Route6 {
        let mut rt = Route6::new(self.flags, self.dev.clone()).with_mtu(self.mtu);
        if let Some(gw) = self.gateway {
            rt = rt.with_gateway(gw);
        }
        rt
    }
}

/// Hands out routes built from the configured specs and counts them.
#[derive(Default)]
pub struct MockRoutes {
    pub input: Mutex<Option<RouteSpec>>,
    pub output: Mutex<Option<RouteSpec>>,
    pub lookups: Mutex<Vec<Flow6>>,
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
}

impl MockRoutes {
    pub fn set_input(&self, spec: Option<RouteSpec>) {
        *self.input.lock().unwrap() = spec;
    }

    pub fn set_output(&self, spec: Option<RouteSpec>) {
        *self.output.lock().unwrap() = spec;
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn last_lookup(&self) -> Flow6 {
        self.lookups.lock().unwrap().last().cloned().unwrap()
    }

    fn get(&self, spec: &Mutex<Option<RouteSpec>>, fl6: &Flow6) -> Option<Route6> {
        self.lookups.lock().unwrap().push(fl6.clone());
        let rt = spec.lock().unwrap().as_ref()?.make();
        self.gets.fetch_add(1, Ordering::SeqCst);
        Some(rt)
    }
}

impl RouteTable for MockRoutes {
    fn input(&self, _mbuf: &Mbuf, fl6: &Flow6) -> Option<Route6> {
        self.get(&self.input, fl6)
    }

    fn output(&self, _mbuf: &Mbuf, fl6: &Flow6) -> Option<Route6> {
        self.get(&self.output, fl6)
    }

    fn put(&self, _rt: Route6) {
        self.puts.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct Sent {
    pub nexthop: Ipv6Addr,
    pub mbuf: Mbuf,
    pub dev: PortId,
}

#[derive(Default)]
pub struct MockNeigh {
    pub sent: Mutex<Vec<Sent>>,
    pub fail: AtomicBool,
}

impl MockNeigh {
    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

impl Neighbour for MockNeigh {
    fn output(&self, nexthop: &Ipv6Addr, mbuf: Mbuf, dev: &NetDev) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Netif("neighbour unresolved".to_string()));
        }
        self.sent.lock().unwrap().push(Sent {
            nexthop: *nexthop,
            mbuf,
            dev: dev.id,
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct MockAddrs {
    pub groups: Mutex<Vec<(PortId, Ipv6Addr)>>,
    pub saddr: Mutex<Option<Ipv6Addr>>,
    pub selects: AtomicUsize,
}

impl MockAddrs {
    pub fn join(&self, port: PortId, group: &str) {
        self.groups.lock().unwrap().push((port, addr(group)));
    }
}

impl InetAddrs for MockAddrs {
    fn chk_mcast_addr(&self, port: PortId, group: &Ipv6Addr, _src: Option<&Ipv6Addr>) -> bool {
        self.groups
            .lock()
            .unwrap()
            .iter()
            .any(|(p, g)| *p == port && g == group)
    }

    fn select_saddr(&self, _dev: &NetDev, _daddr: &Ipv6Addr, _scope: u8) -> Option<Ipv6Addr> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        *self.saddr.lock().unwrap()
    }
}

/// Records every hook point it runs at and drops at the configured one.
#[derive(Default)]
pub struct MockHooks {
    pub drop_at: Mutex<Option<HookPoint>>,
    pub seen: Mutex<Vec<(HookPoint, Option<PortId>, Option<PortId>)>>,
    pub cut_at: Mutex<Option<(HookPoint, usize)>>,
}

impl MockHooks {
    pub fn drop_at(&self, point: HookPoint) {
        *self.drop_at.lock().unwrap() = Some(point);
    }

    /// Trim accepted packets at `point` down to `len` bytes.
    pub fn cut_at(&self, point: HookPoint, len: usize) {
        *self.cut_at.lock().unwrap() = Some((point, len));
    }

    pub fn points(&self) -> Vec<HookPoint> {
        self.seen.lock().unwrap().iter().map(|(p, _, _)| *p).collect()
    }
}

impl InetHooks for MockHooks {
    fn run(
        &self,
        point: HookPoint,
        mbuf: &mut Mbuf,
        in_port: Option<PortId>,
        out_dev: Option<&NetDev>,
    ) -> Verdict {
        self.seen
            .lock()
            .unwrap()
            .push((point, in_port, out_dev.map(|dev| dev.id)));
        if let Some((at, len)) = *self.cut_at.lock().unwrap() {
            if at == point {
                mbuf.trim(mbuf.len().saturating_sub(len));
            }
        }
        if *self.drop_at.lock().unwrap() == Some(point) {
            Verdict::Drop
        } else {
            Verdict::Accept
        }
    }
}

#[derive(Default)]
pub struct MockNetif {
    pub fail_register: AtomicBool,
    pub registered: Mutex<Vec<u16>>,
}

impl Netif for MockNetif {
    fn register_pkt(&self, ether_type: u16) -> Result<()> {
        if self.fail_register.load(Ordering::SeqCst) {
            return Err(Error::Netif(format!("{:#06x} taken", ether_type)));
        }
        self.registered.lock().unwrap().push(ether_type);
        Ok(())
    }

    fn unregister_pkt(&self, ether_type: u16) -> Result<()> {
        let mut registered = self.registered.lock().unwrap();
        let before = registered.len();
        registered.retain(|t| *t != ether_type);
        if registered.len() == before {
            return Err(Error::Netif(format!("{:#06x} not registered", ether_type)));
        }
        Ok(())
    }
}

type HandleFn = dyn Fn(Mbuf) -> Result<Resubmit> + Send + Sync;

/// A protocol handler made of a closure, recording what it was given.
pub struct FnProtocol {
    is_final: bool,
    handle: Box<HandleFn>,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<Vec<u8>>>,
}

impl FnProtocol {
    pub fn new<F>(is_final: bool, handle: F) -> Arc<Self>
    where
        F: Fn(Mbuf) -> Result<Resubmit> + Send + Sync + 'static,
    {
        Arc::new(Self {
            is_final,
            handle: Box::new(handle),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// A final protocol that consumes every packet.
    pub fn sink() -> Arc<Self> {
        Self::new(true, |_| Ok(Resubmit::Consumed))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Inet6Protocol for FnProtocol {
    fn handle(&self, mbuf: Mbuf) -> Result<Resubmit> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(mbuf.data().to_vec());
        (self.handle)(mbuf)
    }

    fn is_final(&self) -> bool {
        self.is_final
    }
}

pub struct Harness {
    pub ipv6: Ipv6,
    pub dev: Arc<NetDev>,
    pub routes: Arc<MockRoutes>,
    pub neigh: Arc<MockNeigh>,
    pub addrs: Arc<MockAddrs>,
    pub hooks: Arc<MockHooks>,
    pub netif: Arc<MockNetif>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_conf(Ipv6Conf::default())
    }

    pub fn forwarding() -> Self {
        Self::with_conf(Ipv6Conf::from_keywords("forwarding on"))
    }

    pub fn with_conf(conf: Ipv6Conf) -> Self {
        let dev = Arc::new(NetDev::new(1, "dpdk0", 1500));
        let routes = Arc::new(MockRoutes::default());
        let neigh = Arc::new(MockNeigh::default());
        let addrs = Arc::new(MockAddrs::default());
        let hooks = Arc::new(MockHooks::default());
        let netif = Arc::new(MockNetif::default());

        let ipv6 = Ipv6Option::new(routes.clone(), neigh.clone(), addrs.clone())
            .conf(conf)
            .hooks(hooks.clone())
            .netif(netif.clone())
            .build();
        ipv6.init().unwrap();

        Self {
            ipv6,
            dev,
            routes,
            neigh,
            addrs,
            hooks,
            netif,
        }
    }

    pub fn route(&self, flags: RouteFlags) -> RouteSpec {
        RouteSpec::new(flags, &self.dev)
    }

    pub fn local_route(&self) {
        self.routes.set_input(Some(self.route(RouteFlags::LOCALIN)));
    }

    pub fn receive(&self, mbuf: Mbuf) -> Result<Disposition> {
        self.ipv6.receive(mbuf, Some(self.dev.as_ref()))
    }

    /// Every route handed out was given back exactly once.
    pub fn assert_routes_released(&self) {
        assert_eq!(self.routes.gets(), self.routes.puts());
    }
}
