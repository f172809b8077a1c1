use crate::CryptoError;
use std::str::FromStr;

/// An author's address: the raw bytes of their Ed25519 verifying key.
///
/// Unlike the recoverable-signature scheme the original prototype built on top of (where an
/// address is a hash of a pubkey and the pubkey itself is recovered from the signature), Ed25519
/// signatures carry no such recovery. So the address *is* the key, encoded the same way this
/// codebase already encodes its other 32-byte peer identifiers.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Address([u8; 32]);

impl Address {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw 32-byte verifying key. An inherent method, not just the `AsRef` impls below, so
    /// callers get it without pinning a trait type parameter at the call site.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl AsRef<[u8; 32]> for Address {
    fn as_ref(&self) -> &[u8; 32] {
        &self.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Address> for [u8; 32] {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Address({})", hex::encode(&self.0[0..4]))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut buf = [0u8; 44];
        base64::encode_config_slice(&self.0, base64::URL_SAFE, &mut buf);
        write!(f, "{}", std::str::from_utf8(&buf).expect("base64 output is ascii"))
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 44 {
            return Err(CryptoError::InvalidAddress(s.to_owned()));
        }
        let mut bytes = [0u8; 32];
        base64::decode_config_slice(s, base64::URL_SAFE, &mut bytes)
            .map_err(|_| CryptoError::InvalidAddress(s.to_owned()))?;
        Ok(Self(bytes))
    }
}

impl serde::Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(serde::de::Error::custom)
    }
}
