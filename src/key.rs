//! Length-prefixed byte-string keys.

use std::fmt;

#[cfg(feature = "ipnet")]
use ipnet::{Ipv4Net, Ipv6Net};
#[cfg(feature = "ipnet")]
use std::net::{Ipv4Addr, Ipv6Addr};

/// An immutable, length-prefixed byte string used as a key, an address, or a
/// netmask.
///
/// Byte 0 always holds the declared length of the key in bytes, counting the
/// length byte itself. Bit positions are counted from the most significant
/// bit of byte 0, so the first addressable payload bit of a plain key is bit
/// 8. Bytes past the owned buffer read as zero; they are never significant.
///
/// ```
/// # use radix_route::ByteKey;
/// let key = ByteKey::from_octets(&[10, 1, 2, 3]);
/// assert_eq!(key.as_bytes(), &[5, 10, 1, 2, 3]);
/// assert_eq!(key.len(), 5);
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteKey(Box<[u8]>);

impl ByteKey {
    /// Create a key from payload octets. The length byte is computed and
    /// prepended, so the declared length is `octets.len() + 1`.
    ///
    /// # Panics
    ///
    /// Panics if the resulting key would not fit its length byte
    /// (`octets.len() > 254`).
    pub fn from_octets(octets: &[u8]) -> Self {
        assert!(octets.len() <= 254, "key of {} octets overflows the length byte", octets.len());
        let mut buf = Vec::with_capacity(octets.len() + 1);
        buf.push(octets.len() as u8 + 1);
        buf.extend_from_slice(octets);
        Self(buf.into_boxed_slice())
    }

    /// Create a key from a raw buffer whose first byte is already the
    /// declared length. The buffer may be longer than the declared length
    /// (the excess is ignored) or shorter (missing bytes read as zero).
    pub fn from_raw(bytes: impl Into<Box<[u8]>>) -> Self {
        Self(bytes.into())
    }

    /// The declared length of the key in bytes (the value of byte 0).
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.byte(0) as usize
    }

    /// The owned buffer, starting at the length byte.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The payload octets, without the length byte.
    pub fn octets(&self) -> &[u8] {
        let end = self.len().min(self.0.len());
        &self.0[1.min(end)..end]
    }

    /// Read byte `i`, treating everything past the owned buffer as zero.
    #[inline(always)]
    pub(crate) fn byte(&self, i: usize) -> u8 {
        self.0.get(i).copied().unwrap_or(0)
    }

    /// Check whether bit `b` is set, where bit 0 is the most significant bit
    /// of the length byte.
    #[inline(always)]
    pub(crate) fn bit(&self, b: u32) -> bool {
        self.byte((b >> 3) as usize) & bit_mask(b) != 0
    }
}

/// The single-bit byte mask selecting bit `b` within its byte.
#[inline(always)]
pub(crate) fn bit_mask(b: u32) -> u8 {
    0x80 >> (b & 0x7)
}

/// First bit position at which `a` and `b` differ, comparing the bytes
/// `[from, a.len())`. `None` means the keys are equal over that range.
pub(crate) fn first_diff_bit(a: &ByteKey, b: &ByteKey, from: usize) -> Option<u32> {
    for i in from..a.len() {
        let x = a.byte(i) ^ b.byte(i);
        if x != 0 {
            return Some(((i as u32) << 3) + x.leading_zeros());
        }
    }
    None
}

impl fmt::Debug for ByteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteKey(")?;
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

#[cfg(feature = "ipnet")]
impl From<Ipv4Addr> for ByteKey {
    fn from(addr: Ipv4Addr) -> Self {
        Self::from_octets(&addr.octets())
    }
}

#[cfg(feature = "ipnet")]
impl From<Ipv6Addr> for ByteKey {
    fn from(addr: Ipv6Addr) -> Self {
        Self::from_octets(&addr.octets())
    }
}

#[cfg(feature = "ipnet")]
impl From<Ipv4Net> for ByteKey {
    /// The key of the network address (host bits cleared).
    fn from(net: Ipv4Net) -> Self {
        Self::from_octets(&net.network().octets())
    }
}

#[cfg(feature = "ipnet")]
impl From<Ipv6Net> for ByteKey {
    /// The key of the network address (host bits cleared).
    fn from(net: Ipv6Net) -> Self {
        Self::from_octets(&net.network().octets())
    }
}

#[cfg(feature = "ipnet")]
impl ByteKey {
    /// The netmask key of an IPv4 network.
    ///
    /// ```
    /// # use radix_route::ByteKey;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let net: Ipv4Net = "10.0.0.0/8".parse()?;
    /// assert_eq!(ByteKey::v4_netmask(&net).as_bytes(), &[5, 255, 0, 0, 0]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn v4_netmask(net: &Ipv4Net) -> Self {
        Self::from_octets(&net.netmask().octets())
    }

    /// The netmask key of an IPv6 network.
    pub fn v6_netmask(net: &Ipv6Net) -> Self {
        Self::from_octets(&net.netmask().octets())
    }
}
