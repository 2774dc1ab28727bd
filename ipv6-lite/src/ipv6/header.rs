use std::net::Ipv6Addr;

use byteorder::{ByteOrder, NetworkEndian};

use crate::mbuf::PktBufMut;

use super::IpProtocol;

header_field_val_accessors! {
    (next_header, next_header_mut, 6),
    (hop_limit, hop_limit_mut, 7),
}

header_field_range_accessors! {
    (f_label, f_label_mut, 1..4),
    (payload_len, payload_len_mut, 4..6),
    (src_ip, src_ip_mut, 8..24),
    (dst_ip, dst_ip_mut, 24..40),
}

/// The byte length of the fixed IPv6 header.
pub const IPV6_HEADER_LEN: usize = 40;

/// A view of the fixed IPv6 header at the front of `buf`.
#[derive(Clone, Copy, Debug)]
pub struct Ipv6Header<T> {
    buf: T,
}

impl<T: AsRef<[u8]>> Ipv6Header<T> {
    /// Wrap `buf`, failing if it is shorter than the fixed header.
    #[inline]
    pub fn new(buf: T) -> Result<Self, T> {
        if buf.as_ref().len() >= IPV6_HEADER_LEN {
            Ok(Self { buf })
        } else {
            Err(buf)
        }
    }

    /// Wrap `buf` without a length check. Accessors panic on a short buffer.
    #[inline]
    pub fn new_unchecked(buf: T) -> Self {
        Self { buf }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf.as_ref()[0..IPV6_HEADER_LEN]
    }

    #[inline]
    pub fn version(&self) -> u8 {
        self.buf.as_ref()[0] >> 4
    }

    #[inline]
    pub fn traffic_class(&self) -> u8 {
        let data = self.buf.as_ref();
        ((data[0] & 0x0f) << 4) | (data[1] >> 4)
    }

    #[inline]
    pub fn flow_label(&self) -> u32 {
        NetworkEndian::read_u24(f_label(self.buf.as_ref())) & 0x0fffff
    }

    #[inline]
    pub fn payload_len(&self) -> u16 {
        NetworkEndian::read_u16(payload_len(self.buf.as_ref()))
    }

    #[inline]
    pub fn next_header(&self) -> IpProtocol {
        (*next_header(self.buf.as_ref())).into()
    }

    #[inline]
    pub fn hop_limit(&self) -> u8 {
        *hop_limit(self.buf.as_ref())
    }

    #[inline]
    pub fn src_addr(&self) -> Ipv6Addr {
        let mut octets = [0; 16];
        octets.copy_from_slice(src_ip(self.buf.as_ref()));
        Ipv6Addr::from(octets)
    }

    #[inline]
    pub fn dst_addr(&self) -> Ipv6Addr {
        let mut octets = [0; 16];
        octets.copy_from_slice(dst_ip(self.buf.as_ref()));
        Ipv6Addr::from(octets)
    }
}

impl<T: AsMut<[u8]>> Ipv6Header<T> {
    #[inline]
    pub fn set_version(&mut self, value: u8) {
        assert!(value <= 0xf);
        let data = self.buf.as_mut();
        data[0] = (data[0] & 0x0f) | (value << 4);
    }

    #[inline]
    pub fn set_traffic_class(&mut self, value: u8) {
        let data = self.buf.as_mut();
        data[0] = (data[0] & 0xf0) | (value >> 4);
        data[1] = (data[1] & 0x0f) | (value << 4);
    }

    #[inline]
    pub fn set_flow_label(&mut self, value: u32) {
        assert!(value <= 0xfffff);
        let data = f_label_mut(self.buf.as_mut());
        let old = NetworkEndian::read_u24(data);
        NetworkEndian::write_u24(data, (old & 0xf00000) | value);
    }

    #[inline]
    pub fn set_payload_len(&mut self, value: u16) {
        NetworkEndian::write_u16(payload_len_mut(self.buf.as_mut()), value);
    }

    #[inline]
    pub fn set_next_header(&mut self, value: IpProtocol) {
        *next_header_mut(self.buf.as_mut()) = value.into();
    }

    #[inline]
    pub fn set_hop_limit(&mut self, value: u8) {
        *hop_limit_mut(self.buf.as_mut()) = value;
    }

    #[inline]
    pub fn set_src_addr(&mut self, value: &Ipv6Addr) {
        src_ip_mut(self.buf.as_mut()).copy_from_slice(&value.octets());
    }

    #[inline]
    pub fn set_dst_addr(&mut self, value: &Ipv6Addr) {
        dst_ip_mut(self.buf.as_mut()).copy_from_slice(&value.octets());
    }
}

impl Ipv6Header<[u8; IPV6_HEADER_LEN]> {
    /// An all-zero header with the version field set to 6.
    #[inline]
    pub fn template() -> Self {
        let mut header = Self {
            buf: [0; IPV6_HEADER_LEN],
        };
        header.set_version(6);
        header
    }
}

/// Prepend `header` to `buf` and fill in the payload length from the data
/// that was already there.
///
/// Returns `false` and leaves `buf` untouched if the headroom is too small or
/// the current data does not fit in the payload length field.
pub fn prepend_header<B, HT>(buf: &mut B, header: &Ipv6Header<HT>) -> bool
where
    B: PktBufMut,
    HT: AsRef<[u8]>,
{
    let payload_len = buf.remaining();
    if buf.chunk_headroom() < IPV6_HEADER_LEN || payload_len > usize::from(u16::MAX) {
        return false;
    }
    buf.move_back(IPV6_HEADER_LEN);

    let data = &mut buf.chunk_mut()[0..IPV6_HEADER_LEN];
    data.copy_from_slice(header.as_bytes());
    Ipv6Header::new_unchecked(data).set_payload_len(payload_len as u16);
    true
}
