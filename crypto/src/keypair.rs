use crate::{Address, CryptoError};
use ed25519_dalek::{PublicKey, SecretKey, Signature, Signer, Verifier};

/// Abstract signing capability the rest of this codebase is written against.
///
/// The concrete elliptic-curve library is deliberately not part of this trait's contract — swap
/// in a different [`KeyPair`] implementation (hardware-backed, a different curve, a remote
/// signer) without touching the change model, the DAL, or the DHT overlay.
pub trait KeyPair {
    /// The address this key signs as.
    fn address(&self) -> Address;

    /// Signs `message`, returning the raw signature bytes.
    fn sign(&self, message: &[u8]) -> Vec<u8>;
}

/// The concrete signing key this codebase ships: an Ed25519 keypair.
pub struct Ed25519KeyPair(ed25519_dalek::Keypair);

impl Ed25519KeyPair {
    /// Generates a fresh random keypair.
    pub fn generate() -> Self {
        let mut secret_bytes = [0u8; 32];
        getrandom::getrandom(&mut secret_bytes).expect("system RNG must be available");
        let secret = SecretKey::from_bytes(&secret_bytes).expect("32 bytes is always a valid scalar seed");
        let public = PublicKey::from(&secret);
        Self(ed25519_dalek::Keypair { secret, public })
    }

    /// Restores a keypair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Result<Self, CryptoError> {
        let secret = SecretKey::from_bytes(seed).map_err(|_| CryptoError::InvalidKey)?;
        let public = PublicKey::from(&secret);
        Ok(Self(ed25519_dalek::Keypair { secret, public }))
    }

    /// The 32-byte seed this key was derived from, for callers that need to persist it (e.g. to
    /// a keypair file) and restore it later via [`Ed25519KeyPair::from_seed`].
    pub fn seed(&self) -> [u8; 32] {
        self.0.secret.to_bytes()
    }
}

impl KeyPair for Ed25519KeyPair {
    fn address(&self) -> Address {
        Address::new(self.0.public.to_bytes())
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.0.sign(message).to_bytes().to_vec()
    }
}

/// Verifies that `signature` over `message` was produced by the key behind `address`.
///
/// Never fails loudly: an invalid address, a malformed signature, or a signature mismatch all
/// simply yield `false`.
pub fn verify(address: &Address, signature: &[u8], message: &[u8]) -> bool {
    let public = match PublicKey::from_bytes(address.as_bytes()) {
        Ok(public) => public,
        Err(_) => return false,
    };
    let sig = match Signature::from_bytes(signature) {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    public.verify(message, &sig).is_ok()
}

/// Signs `message` with `key`.
pub fn sign(message: &[u8], key: &dyn KeyPair) -> Vec<u8> {
    key.sign(message)
}

/// Derives the address of `key`.
pub fn address_from_key(key: &dyn KeyPair) -> Address {
    key.address()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signs_and_verifies() {
        let key = Ed25519KeyPair::generate();
        let addr = key.address();
        let sig = sign(b"hello", &key);
        assert!(verify(&addr, &sig, b"hello"));
        assert!(!verify(&addr, &sig, b"goodbye"));
    }

    #[test]
    fn verify_never_panics_on_garbage() {
        let addr = Address::new([1u8; 32]);
        assert!(!verify(&addr, b"not a signature", b"anything"));
    }
}
