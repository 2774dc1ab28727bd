//! Built-in extension header handlers.
//!
//! Hop-by-hop and destination options are non-final protocols: they check the
//! header, record its size in [`Mbuf::l3_len`] and hand the next header back to
//! the dispatcher. "No next header" is a final protocol that swallows whatever
//! is left.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ipv6::{IpProtocol, Ipv6Header, IPV6_HEADER_LEN};
use crate::mbuf::Mbuf;
use crate::netif::ExtHdrParser;
use crate::protocol::{Inet6Protocol, ProtoRegistry, Resubmit};

const OPT_PAD1: u8 = 0x00;
const OPT_PADN: u8 = 0x01;
const OPT_ROUTER_ALERT: u8 = 0x05;
const OPT_JUMBO: u8 = 0xc2;

/// Size of the options header at the front of `data`, in bytes.
fn ext_hdr_len(data: &[u8]) -> Result<usize> {
    if data.len() < 8 {
        return Err(Error::Malformed("truncated extension header"));
    }
    let len = (usize::from(data[1]) + 1) * 8;
    if data.len() < len {
        return Err(Error::Malformed("truncated extension header"));
    }
    Ok(len)
}

/// Walk the TLV encoded options of a hop-by-hop or destination options header.
fn check_options(opts: &[u8], hopopts: bool) -> Result<()> {
    let mut off = 0;
    while off < opts.len() {
        let ty = opts[off];
        if ty == OPT_PAD1 {
            off += 1;
            continue;
        }

        if off + 2 > opts.len() || off + 2 + usize::from(opts[off + 1]) > opts.len() {
            return Err(Error::Malformed("option overruns its header"));
        }

        match ty {
            OPT_PADN => {}
            OPT_ROUTER_ALERT if hopopts => {}
            OPT_JUMBO if hopopts => {
                return Err(Error::Malformed("jumbo payload is not supported"));
            }
            // the two high-order bits tell what to do with an unknown option,
            // only 00 allows skipping it
            _ if ty >> 6 == 0 => {}
            _ => {
                debug!("discard packet with unrecognized option {:#04x}", ty);
                return Err(Error::Malformed("unrecognized option"));
            }
        }
        off += 2 + usize::from(opts[off + 1]);
    }
    Ok(())
}

#[derive(Debug)]
struct HopOpts;

impl Inet6Protocol for HopOpts {
    fn handle(&self, mut mbuf: Mbuf) -> Result<Resubmit> {
        // RFC 8200 4.1: hop-by-hop options may only follow the fixed header
        if mbuf.network_header_consumed() != IPV6_HEADER_LEN {
            return Err(Error::Malformed("hop-by-hop options not first"));
        }
        // the options were checked by `parse_hopopts` on receive
        let len = ext_hdr_len(mbuf.data())?;
        let next = IpProtocol::from(mbuf.data()[0]);
        mbuf.set_l3_len(len);
        Ok(Resubmit::Next(next, mbuf))
    }
}

#[derive(Debug)]
struct DstOpts;

impl Inet6Protocol for DstOpts {
    fn handle(&self, mut mbuf: Mbuf) -> Result<Resubmit> {
        let len = ext_hdr_len(mbuf.data())?;
        check_options(&mbuf.data()[2..len], false)?;
        let next = IpProtocol::from(mbuf.data()[0]);
        mbuf.set_l3_len(len);
        Ok(Resubmit::Next(next, mbuf))
    }
}

#[derive(Debug)]
struct NoNextHeader;

impl Inet6Protocol for NoNextHeader {
    fn handle(&self, _mbuf: Mbuf) -> Result<Resubmit> {
        Ok(Resubmit::Consumed)
    }

    fn is_final(&self) -> bool {
        true
    }
}

/// The extension header handlers installed by [`crate::Ipv6::init`], also
/// serving as the default hop-by-hop pre-parser.
pub struct Ipv6ExtHdrs {
    prots: [(IpProtocol, Arc<dyn Inet6Protocol>); 3],
}

impl Ipv6ExtHdrs {
    pub fn new() -> Self {
        Self {
            prots: [
                (IpProtocol::HOPOPTS, Arc::new(HopOpts)),
                (IpProtocol::DSTOPTS, Arc::new(DstOpts)),
                (IpProtocol::NONE, Arc::new(NoNextHeader)),
            ],
        }
    }

    /// Register every handler, rolling back on the first conflict.
    pub fn init(&self, reg: &ProtoRegistry) -> Result<()> {
        for (i, (protocol, prot)) in self.prots.iter().enumerate() {
            if let Err(err) = reg.register(prot.clone(), *protocol) {
                for (protocol, prot) in self.prots[..i].iter() {
                    let _ = reg.unregister(prot, *protocol);
                }
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn term(&self, reg: &ProtoRegistry) {
        for (protocol, prot) in self.prots.iter() {
            if let Err(err) = reg.unregister(prot, *protocol) {
                warn!("fail to unregister extension header {}: {}", protocol.raw(), err);
            }
        }
    }
}

impl Default for Ipv6ExtHdrs {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Ipv6ExtHdrs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let protocols: Vec<u8> = self.prots.iter().map(|(p, _)| p.raw()).collect();
        f.debug_struct("Ipv6ExtHdrs")
            .field("protocols", &protocols)
            .finish()
    }
}

impl ExtHdrParser for Ipv6ExtHdrs {
    fn parse_hopopts(&self, mbuf: &mut Mbuf) -> Result<()> {
        let hdr = Ipv6Header::new(mbuf.data()).map_err(|_| Error::Malformed("truncated header"))?;
        if hdr.payload_len() == 0 {
            return Err(Error::Malformed("jumbo payload is not supported"));
        }

        let ext = &mbuf.data()[IPV6_HEADER_LEN..];
        let len = ext_hdr_len(ext)?;
        check_options(&ext[2..len], true)
    }
}
