use crate::mbuf::Mbuf;
use crate::route::{Route6, RouteTable};

/// A packet travelling through the pipeline together with its route slot.
///
/// `R` is `()` until the route lookup and [`Route6`] afterwards, so the
/// routed stages cannot be entered without a route.
#[derive(Debug)]
pub(crate) struct Pkt<R = ()> {
    pub(crate) mbuf: Mbuf,
    pub(crate) rt: R,
}

/// Something the pipeline must give back before it lets go of a packet.
pub(crate) trait RouteSlot {
    fn release(self, routes: &dyn RouteTable);
}

impl RouteSlot for () {
    #[inline]
    fn release(self, _: &dyn RouteTable) {}
}

impl RouteSlot for Route6 {
    #[inline]
    fn release(self, routes: &dyn RouteTable) {
        routes.put(self);
    }
}

impl Pkt {
    #[inline]
    pub(crate) fn new(mbuf: Mbuf) -> Self {
        Self { mbuf, rt: () }
    }

    #[inline]
    pub(crate) fn with_route(self, rt: Route6) -> Pkt<Route6> {
        Pkt { mbuf: self.mbuf, rt }
    }
}

impl<R: RouteSlot> Pkt<R> {
    /// Release the route slot and keep the buffer.
    #[inline]
    pub(crate) fn into_mbuf(self, routes: &dyn RouteTable) -> Mbuf {
        self.rt.release(routes);
        self.mbuf
    }
}
