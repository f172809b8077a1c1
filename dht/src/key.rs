use guarantor_change::ChangeId;
use guarantor_crypto::Address;
use sha1::{Digest, Sha1};
use std::fmt;

/// A 160-bit Kademlia node-space key: `SHA1` of either a change-id or an author address.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Key([u8; 20]);

impl Key {
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let digest = Sha1::digest(bytes);
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest);
        Self(out)
    }

    pub fn from_change_id(change_id: &ChangeId) -> Self {
        Self::from_bytes(change_id.as_str().as_bytes())
    }

    pub fn from_address(address: &Address) -> Self {
        Self::from_bytes(address.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// XOR distance to `other`, the Kademlia metric.
    pub fn distance(&self, other: &Key) -> Distance {
        let mut out = [0u8; 20];
        for (o, (a, b)) in out.iter_mut().zip(self.0.iter().zip(other.0.iter())) {
            *o = a ^ b;
        }
        Distance(out)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Key({})", hex::encode(self.0))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// An XOR distance between two [`Key`]s. Byte-lexicographic order on the raw XOR bytes is the
/// same order as numeric order on the 160-bit integer they represent, since both are big-endian.
#[derive(Clone, Copy, Eq, Ord, PartialEq, PartialOrd)]
pub struct Distance([u8; 20]);

impl Distance {
    /// An approximation of this distance as `f64`, keeping only the 16 most-significant bytes
    /// (128 of the 160 bits). Used solely to compute the weighted cull order in
    /// [`crate::Storage::cull`]; losing the bottom 32 bits of precision never flips the ordering
    /// of two distances that differ in their top 128 bits, which in practice is every pair that
    /// matters for eviction.
    pub fn approx_f64(&self) -> f64 {
        let mut high = [0u8; 16];
        high.copy_from_slice(&self.0[..16]);
        u128::from_be_bytes(high) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let k = Key::from_bytes(b"hello");
        assert_eq!(k.distance(&k).approx_f64(), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Key::from_bytes(b"a");
        let b = Key::from_bytes(b"b");
        assert_eq!(a.distance(&b).approx_f64(), b.distance(&a).approx_f64());
    }
}
