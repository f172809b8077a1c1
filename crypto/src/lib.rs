//! Canonical JSON hashing, key handling and address derivation.
//!
//! This is the only part of `guarantor` that knows about an elliptic curve. Everything above it
//! — the change model, the doc-diff engine, the DAL, the DHT overlay — is written against the
//! [`KeyPair`] trait and the address/hash types here, never against `ed25519_dalek` directly.
mod address;
mod canonical;
mod error;
mod keypair;

pub use crate::address::Address;
pub use crate::error::CryptoError;
pub use crate::keypair::{address_from_key, sign, verify, Ed25519KeyPair, KeyPair};

use sha2::{Digest, Sha256};

/// Hashes `value` per RFC 8785 (JSON Canonicalization Scheme) followed by SHA-256, returning the
/// lowercase hex digest.
///
/// This is the only hash permitted for any id-bearing field in this codebase: two semantically
/// equal JSON objects, however their keys were ordered, always hash identically.
pub fn canonical_hash(value: &serde_json::Value) -> String {
    let bytes = canonical::canonicalize(value);
    let digest = Sha256::digest(&bytes);
    let hash = hex::encode(digest);
    tracing::trace!(%hash, "canonical_hash");
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    /// Generates arbitrary JSON values: objects and arrays nested up to a few levels deep over a
    /// handful of primitive leaves, enough to exercise `canonicalize` without blowing up case time.
    fn arb_json() -> impl Strategy<Value = serde_json::Value> {
        let leaf = prop_oneof![
            Just(serde_json::Value::Null),
            any::<bool>().prop_map(serde_json::Value::from),
            any::<i64>().prop_map(serde_json::Value::from),
            "[a-z]{0,8}".prop_map(serde_json::Value::from),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(serde_json::Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..6).prop_map(|m| {
                    serde_json::Value::Object(m.into_iter().collect())
                }),
            ]
        })
    }

    #[test]
    fn hash_is_stable_under_key_reordering() {
        let a = json!({"address": "x", "doctype": "y", "opdata": {"z": 1, "a": 2}});
        let b = json!({"doctype": "y", "opdata": {"a": 2, "z": 1}, "address": "x"});
        assert_eq!(canonical_hash(&a), canonical_hash(&b));
    }

    #[test]
    fn hash_changes_when_content_changes() {
        let a = json!({"a": 1});
        let b = json!({"a": 2});
        assert_ne!(canonical_hash(&a), canonical_hash(&b));
    }

    proptest! {
        /// Property 2 (whitespace half): re-serializing the same value compactly or pretty-printed
        /// and parsing it back must hash identically, since canonicalization strips whitespace.
        #[test]
        fn hash_is_stable_under_whitespace(value in arb_json()) {
            let compact: serde_json::Value = serde_json::from_str(&serde_json::to_string(&value).unwrap()).unwrap();
            let pretty: serde_json::Value = serde_json::from_str(&serde_json::to_string_pretty(&value).unwrap()).unwrap();
            prop_assert_eq!(canonical_hash(&compact), canonical_hash(&pretty));
        }

        /// Property 2 (key-reordering half), generated rather than hand-written: shuffling an
        /// object's entries before building the `Value` yields the same hash, since `Value`'s map
        /// is key-sorted regardless of input order.
        #[test]
        fn hash_is_stable_under_generated_key_reordering(entries in prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 1..8)) {
            let forward: serde_json::Map<String, serde_json::Value> =
                entries.iter().map(|(k, v)| (k.clone(), serde_json::Value::from(*v))).collect();
            let reversed: serde_json::Map<String, serde_json::Value> =
                entries.iter().rev().map(|(k, v)| (k.clone(), serde_json::Value::from(*v))).collect();
            prop_assert_eq!(
                canonical_hash(&serde_json::Value::Object(forward)),
                canonical_hash(&serde_json::Value::Object(reversed))
            );
        }

        #[test]
        fn distinct_values_hash_differently(a in arb_json(), b in arb_json()) {
            prop_assume!(a != b);
            prop_assert_ne!(canonical_hash(&a), canonical_hash(&b));
        }
    }
}
