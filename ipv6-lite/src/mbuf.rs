pub use bytes::Buf;

use crate::netif::PortId;

/// Bytes reserved in front of the packet data of a freshly built [`Mbuf`].
pub const MBUF_HEADROOM: usize = 128;

/// A [`Buf`] whose consumed front can be restored and whose tail can be cut.
pub trait PktBuf: Buf {
    /// Move the cursor back by `cnt` bytes, exposing previously consumed data.
    fn move_back(&mut self, cnt: usize);

    /// Remove `cnt` trailing bytes.
    fn trim_off(&mut self, cnt: usize);
}

/// A [`PktBuf`] that can be written and grown into its headroom.
pub trait PktBufMut: PktBuf {
    /// Bytes available in front of the current chunk.
    fn chunk_headroom(&self) -> usize;

    /// The current chunk as a mutable slice.
    fn chunk_mut(&mut self) -> &mut [u8];
}

/// The link-layer classification of a received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EthPktType {
    /// Addressed to the receiving interface.
    Host,
    Broadcast,
    Multicast,
    /// Addressed to some other station, seen because of promiscuous mode.
    OtherHost,
}

/// A single-segment packet buffer.
///
/// The data lives at `buf[data_off..data_off + data_len]`; everything before
/// `data_off` is headroom that [`Mbuf::prepend`] and [`PktBuf::move_back`]
/// can grow into. Besides the data the buffer carries the per-packet metadata
/// the IPv6 layer works with:
///
/// - `l3_len`: the size of the header currently being processed. It starts as
///   the fixed header size and every extension header handler rewrites it to
///   the size of the header it just parsed.
/// - `port`: the ingress port on receive, the egress port after routing.
/// - `packet_type`: the link-layer class of the frame.
/// - `ether_type`: the protocol tag handed down to the link layer on output.
/// - the network header offset, recorded once the fixed header is validated so
///   that upper layers can still read it after the header was consumed.
#[derive(Debug, Clone)]
pub struct Mbuf {
    buf: Vec<u8>,
    data_off: usize,
    data_len: usize,
    nh_off: usize,
    l3_len: usize,
    port: PortId,
    packet_type: EthPktType,
    ether_type: u16,
}

impl Mbuf {
    /// Build a buffer holding a copy of `data` behind [`MBUF_HEADROOM`] bytes
    /// of headroom.
    pub fn from_slice(data: &[u8]) -> Self {
        Self::with_headroom(MBUF_HEADROOM, data)
    }

    pub fn with_headroom(headroom: usize, data: &[u8]) -> Self {
        let mut buf = vec![0; headroom + data.len()];
        buf[headroom..].copy_from_slice(data);
        Self {
            buf,
            data_off: headroom,
            data_len: data.len(),
            nh_off: headroom,
            l3_len: 0,
            port: 0,
            packet_type: EthPktType::Host,
            ether_type: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data_len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data_len == 0
    }

    #[inline]
    pub fn front_capacity(&self) -> usize {
        self.data_off
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.buf[self.data_off..self.data_off + self.data_len]
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.data_off..self.data_off + self.data_len]
    }

    /// Check that the first `len` bytes can be read as one contiguous header.
    #[inline]
    pub fn may_pull(&self, len: usize) -> bool {
        self.data_len >= len
    }

    /// Strip `cnt` bytes from the front. Returns `false` and leaves the buffer
    /// untouched if it holds fewer than `cnt` bytes.
    #[inline]
    pub fn adj(&mut self, cnt: usize) -> bool {
        if cnt > self.data_len {
            return false;
        }
        self.data_off += cnt;
        self.data_len -= cnt;
        true
    }

    /// Strip `cnt` bytes from the tail. Returns `false` and leaves the buffer
    /// untouched if it holds fewer than `cnt` bytes.
    #[inline]
    pub fn trim(&mut self, cnt: usize) -> bool {
        if cnt > self.data_len {
            return false;
        }
        self.data_len -= cnt;
        true
    }

    /// Grow the data by `cnt` bytes into the headroom and return the new
    /// front, or `None` if the headroom is too small.
    #[inline]
    pub fn prepend(&mut self, cnt: usize) -> Option<&mut [u8]> {
        if cnt > self.data_off {
            return None;
        }
        self.data_off -= cnt;
        self.data_len += cnt;
        Some(&mut self.buf[self.data_off..self.data_off + cnt])
    }

    /// Append `slice` at the tail, growing the underlying storage if needed.
    pub fn extend_from_slice(&mut self, slice: &[u8]) {
        let end = self.data_off + self.data_len;
        self.buf.truncate(end);
        self.buf.extend_from_slice(slice);
        self.data_len += slice.len();
    }

    #[inline]
    pub fn l3_len(&self) -> usize {
        self.l3_len
    }

    #[inline]
    pub fn set_l3_len(&mut self, len: usize) {
        self.l3_len = len;
    }

    #[inline]
    pub fn port(&self) -> PortId {
        self.port
    }

    #[inline]
    pub fn set_port(&mut self, port: PortId) {
        self.port = port;
    }

    #[inline]
    pub fn packet_type(&self) -> EthPktType {
        self.packet_type
    }

    #[inline]
    pub fn set_packet_type(&mut self, packet_type: EthPktType) {
        self.packet_type = packet_type;
    }

    #[inline]
    pub fn ether_type(&self) -> u16 {
        self.ether_type
    }

    #[inline]
    pub fn set_ether_type(&mut self, ether_type: u16) {
        self.ether_type = ether_type;
    }

    /// Remember the current front as the start of the network header.
    #[inline]
    pub fn mark_network_header(&mut self) {
        self.nh_off = self.data_off;
    }

    /// The bytes from the recorded network header up to the end of the data.
    ///
    /// Stays valid after the front was stripped with [`Mbuf::adj`]. Empty if
    /// the tail was trimmed past the recorded offset.
    #[inline]
    pub fn network_header(&self) -> &[u8] {
        self.buf
            .get(self.nh_off..self.data_off + self.data_len)
            .unwrap_or(&[])
    }

    /// Bytes consumed since the network header was recorded.
    #[inline]
    pub fn network_header_consumed(&self) -> usize {
        self.data_off.saturating_sub(self.nh_off)
    }
}

impl Buf for Mbuf {
    #[inline]
    fn remaining(&self) -> usize {
        self.data_len
    }

    #[inline]
    fn chunk(&self) -> &[u8] {
        self.data()
    }

    #[inline]
    fn advance(&mut self, cnt: usize) {
        assert!(self.adj(cnt));
    }
}

impl PktBuf for Mbuf {
    #[inline]
    fn move_back(&mut self, cnt: usize) {
        assert!(cnt <= self.data_off);
        self.data_off -= cnt;
        self.data_len += cnt;
    }

    #[inline]
    fn trim_off(&mut self, cnt: usize) {
        assert!(self.trim(cnt));
    }
}

impl PktBufMut for Mbuf {
    #[inline]
    fn chunk_headroom(&self) -> usize {
        self.data_off
    }

    #[inline]
    fn chunk_mut(&mut self) -> &mut [u8] {
        self.data_mut()
    }
}
