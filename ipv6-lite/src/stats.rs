//! Per-worker IPv6 counters.
//!
//! Each worker thread owns one [`InetStats`] block. The pipeline bumps the
//! counters of the thread it runs on without any synchronization, and readers
//! take a copy of the block with [`read_local_stats`]. Aggregating the blocks
//! of several workers is left to the caller, see [`InetStats::merge`].

use std::cell::RefCell;

use serde::Serialize;

macro_rules! inet_stats {
    (
        $(#[$attr: meta])*
        pub struct $tname:ident {
            $(
                $(#[$field_attr: meta])*
                $field:ident
            ),+ $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
        pub struct $tname {
            $(
                $(#[$field_attr])*
                pub $field: u64,
            )+
        }

        impl $tname {
            /// Add the counters of `other` to `self`.
            pub fn merge(&mut self, other: &$tname) {
                $( self.$field += other.$field; )+
            }

            /// Counter increments between an `earlier` snapshot and `self`.
            pub fn since(&self, earlier: &$tname) -> $tname {
                $tname {
                    $( $field: self.$field.wrapping_sub(earlier.$field), )+
                }
            }
        }
    };
}

inet_stats! {
    /// The IPv6 counter block of one worker.
    pub struct InetStats {
        in_pkts,
        in_octets,
        in_hdr_errors,
        in_too_big_errors,
        in_no_routes,
        in_addr_errors,
        in_unknown_protos,
        in_truncated_pkts,
        in_discards,
        in_delivers,
        in_mcast_pkts,
        in_mcast_octets,
        out_forw_datagrams,
        out_forw_octets,
        out_pkts,
        out_octets,
        out_discards,
        out_no_routes,
        out_mcast_pkts,
        out_mcast_octets,
        frag_fails,
    }
}

thread_local! {
    pub(crate) static IP6_STATS: RefCell<InetStats> = RefCell::new(InetStats::default());
}

/// Copy the counter block of the calling worker.
pub fn read_local_stats() -> InetStats {
    IP6_STATS.with(|stats| *stats.borrow())
}

macro_rules! ip6_inc_stats {
    ($($field:ident),+ $(,)?) => {
        $crate::stats::IP6_STATS.with(|stats| {
            let mut stats = stats.borrow_mut();
            $( stats.$field += 1; )+
        })
    };
}

macro_rules! ip6_add_stats {
    ($field:ident, $val:expr) => {
        $crate::stats::IP6_STATS.with(|stats| {
            stats.borrow_mut().$field += ($val) as u64;
        })
    };
}

macro_rules! ip6_upd_po_stats {
    ($pkts:ident, $octets:ident, $val:expr) => {
        $crate::stats::IP6_STATS.with(|stats| {
            let mut stats = stats.borrow_mut();
            stats.$pkts += 1;
            stats.$octets += ($val) as u64;
        })
    };
}
