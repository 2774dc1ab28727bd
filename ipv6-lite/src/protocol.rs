//! The table of upper-layer protocols and extension header handlers.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{Error, Result};
use crate::ipv6::IpProtocol;
use crate::mbuf::Mbuf;

/// Number of distinct next-header values.
pub const INET_MAX_PROTS: usize = 256;

/// What a protocol handler did with the packet.
#[derive(Debug)]
pub enum Resubmit {
    /// Another header follows. The handler has set [`Mbuf::l3_len`] to the
    /// size of the header it parsed and returns the buffer together with the
    /// value of the next header.
    Next(IpProtocol, Mbuf),
    /// The packet was consumed.
    Consumed,
}

/// A handler registered for one next-header value.
pub trait Inet6Protocol: Send + Sync {
    /// Process the header at the front of `mbuf`.
    ///
    /// An error means the handler dropped the packet.
    fn handle(&self, mbuf: Mbuf) -> Result<Resubmit>;

    /// A final protocol terminates the extension header chain: only other
    /// final protocols may follow it.
    fn is_final(&self) -> bool {
        false
    }
}

type ProtoSlot = Option<Arc<dyn Inet6Protocol>>;

/// Next-header value to handler table.
///
/// Lookups run on every delivered packet and take the read lock; registration
/// is rare and takes the write lock. The handler is cloned out of the table, so
/// no lock is held while it runs and handlers may themselves use the table.
pub struct ProtoRegistry {
    prots: RwLock<[ProtoSlot; INET_MAX_PROTS]>,
}

impl ProtoRegistry {
    pub fn new() -> Self {
        Self {
            prots: RwLock::new(std::array::from_fn(|_| None)),
        }
    }

    /// Install `prot` for `protocol`. Fails if the slot is taken.
    pub fn register(&self, prot: Arc<dyn Inet6Protocol>, protocol: IpProtocol) -> Result<()> {
        let mut prots = self.prots.write().unwrap_or_else(PoisonError::into_inner);
        let slot = &mut prots[usize::from(protocol.raw())];
        if slot.is_some() {
            return Err(Error::Exist(protocol.raw()));
        }
        *slot = Some(prot);
        Ok(())
    }

    /// Remove `prot` from `protocol`. Fails, leaving the table untouched, if
    /// the slot holds anything else.
    pub fn unregister(&self, prot: &Arc<dyn Inet6Protocol>, protocol: IpProtocol) -> Result<()> {
        let mut prots = self.prots.write().unwrap_or_else(PoisonError::into_inner);
        let slot = &mut prots[usize::from(protocol.raw())];
        if !matches!(slot, Some(cur) if same_protocol(cur, prot)) {
            return Err(Error::NotExist(protocol.raw()));
        }
        *slot = None;
        Ok(())
    }

    #[inline]
    pub fn lookup(&self, protocol: IpProtocol) -> Option<Arc<dyn Inet6Protocol>> {
        let prots = self.prots.read().unwrap_or_else(PoisonError::into_inner);
        prots[usize::from(protocol.raw())].clone()
    }
}

impl Default for ProtoRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProtoRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prots = self.prots.read().unwrap_or_else(PoisonError::into_inner);
        let registered: Vec<u8> = prots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(nh, _)| nh as u8)
            .collect();
        f.debug_struct("ProtoRegistry")
            .field("registered", &registered)
            .finish()
    }
}

// compare the data pointers only, vtables of one type may differ across
// codegen units
#[inline]
fn same_protocol(a: &Arc<dyn Inet6Protocol>, b: &Arc<dyn Inet6Protocol>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}
