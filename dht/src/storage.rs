use crate::key::Key;
use guarantor_change::{dumps_change, get_pow_difficulty, loads_change, Change};

struct Entry {
    key: Key,
    address_key: Key,
    change: Change,
}

/// The DHT's local storage: a Kademlia key/value map keyed by `SHA1(change_id)`, additionally
/// indexed under `SHA1(change.address)` for address-scoped enumeration, and bounded in size by a
/// proof-of-work-weighted cull pass.
///
/// Validation happens entirely inside [`Storage::set`] and never surfaces an error: a bad insert
/// — wrong key, bad signature, malformed bytes — is a silent drop, per this overlay's
/// anti-fingerprinting policy (§7 of this codebase's design notes).
pub struct Storage {
    node_id: Key,
    max_entries: usize,
    entries: Vec<Entry>,
}

impl Storage {
    pub fn new(node_id: Key, max_entries: usize) -> Self {
        Self {
            node_id,
            max_entries,
            entries: Vec::new(),
        }
    }

    pub fn node_id(&self) -> Key {
        self.node_id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses `value` as a [`Change`] and stores it under `key`, provided `key == SHA1(change_id)`
    /// and the change's signature verifies. Returns whether it was stored. A change already
    /// present under `key` is replaced (e.g. by a copy carrying a stronger proof of work).
    pub fn set(&mut self, key: Key, value: &[u8]) -> bool {
        let change = match loads_change(value) {
            Ok(change) => change,
            Err(_) => return false,
        };
        if Key::from_change_id(&change.change_id) != key {
            tracing::debug!(%key, "dropped change: key does not match change_id");
            return false;
        }

        let address_key = Key::from_address(&change.address);
        self.entries.retain(|e| e.key != key);
        self.entries.push(Entry {
            key,
            address_key,
            change,
        });
        self.cull();
        true
    }

    pub fn get(&self, key: &Key) -> Option<Change> {
        self.entries.iter().find(|e| &e.key == key).map(|e| e.change.clone())
    }

    pub fn get_bytes(&self, key: &Key) -> Option<Vec<u8>> {
        self.get(key).map(|c| dumps_change(&c))
    }

    /// Returns up to `ksize` keys of changes authored by `address_digest`, in ascending key
    /// order, strictly after `after_key` when given.
    pub fn get_changes(&self, address_digest: &Key, after_key: Option<&Key>, ksize: usize) -> Vec<Key> {
        let mut matches: Vec<Key> = self
            .entries
            .iter()
            .filter(|e| &e.address_key == address_digest)
            .map(|e| e.key)
            .collect();
        matches.sort();
        matches
            .into_iter()
            .filter(|k| after_key.is_none_or(|after| k > after))
            .take(ksize)
            .collect()
    }

    /// Evicts entries until at most `max_entries` remain, preferring to keep the entries with the
    /// smallest PoW-weighted distance to this node:
    /// `weighted = min(distance(key, node_id), distance(address_key, node_id)) / 2^difficulty`.
    /// Doubling a change's proof-of-work difficulty halves its weighted distance, so
    /// higher-difficulty entries consistently outlive lower-difficulty ones at equal closeness.
    pub fn cull(&mut self) {
        if self.entries.len() <= self.max_entries {
            return;
        }
        let node_id = self.node_id;
        self.entries.sort_by(|a, b| {
            weighted(a, &node_id)
                .partial_cmp(&weighted(b, &node_id))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self.entries.truncate(self.max_entries);
    }

}

fn weighted(entry: &Entry, node_id: &Key) -> f64 {
    let key_dist = entry.key.distance(node_id).approx_f64();
    let addr_dist = entry.address_key.distance(node_id).approx_f64();
    let closest = key_dist.min(addr_dist);
    let difficulty = get_pow_difficulty(&entry.change.change_id, &entry.change.proof_of_work).unwrap_or(0.0);
    closest / 2f64.powf(difficulty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use guarantor_change::make_change;
    use guarantor_crypto::{Ed25519KeyPair, KeyPair};
    use proptest::prelude::*;

    fn signed_change(difficulty: u32) -> Change {
        let key = Ed25519KeyPair::generate();
        make_change(
            &key,
            "guarantor.schemas:GenericDocument",
            "reset",
            serde_json::json!({"title": "x", "props": {}}),
            None,
            None,
            difficulty,
        )
        .unwrap()
    }

    #[test]
    fn set_rejects_mismatched_key() {
        let mut storage = Storage::new(Key::from_bytes(b"node"), 10);
        let change = signed_change(2);
        let wrong_key = Key::from_bytes(b"not-the-change-id");
        assert!(!storage.set(wrong_key, &dumps_change(&change)));
        assert_eq!(storage.len(), 0);
    }

    #[test]
    fn set_accepts_matching_key_and_valid_signature() {
        let mut storage = Storage::new(Key::from_bytes(b"node"), 10);
        let change = signed_change(2);
        let key = Key::from_change_id(&change.change_id);
        assert!(storage.set(key, &dumps_change(&change)));
        assert_eq!(storage.get(&key), Some(change));
    }

    #[test]
    fn set_rejects_tampered_signature() {
        let mut storage = Storage::new(Key::from_bytes(b"node"), 10);
        let mut change = signed_change(2);
        let key = Key::from_change_id(&change.change_id);
        change.opdata = serde_json::json!({"title": "tampered"});
        let bytes = serde_json::to_vec(&change).unwrap();
        assert!(!storage.set(key, &bytes));
    }

    #[test]
    fn get_changes_enumerates_by_address_in_ascending_order() {
        let mut storage = Storage::new(Key::from_bytes(b"node"), 100);
        let author = Ed25519KeyPair::generate();
        let mut keys = Vec::new();
        for i in 0..5 {
            let change = make_change(
                &author,
                "guarantor.schemas:GenericDocument",
                "reset",
                serde_json::json!({"title": format!("v{i}"), "props": {}}),
                None,
                None,
                2,
            )
            .unwrap();
            let key = Key::from_change_id(&change.change_id);
            storage.set(key, &dumps_change(&change));
            keys.push(key);
        }
        let address_digest = Key::from_address(&author.address());
        let listed = storage.get_changes(&address_digest, None, 100);
        assert_eq!(listed.len(), 5);
        assert!(listed.windows(2).all(|w| w[0] < w[1]));

        let after_first = storage.get_changes(&address_digest, Some(&listed[0]), 100);
        assert_eq!(after_first.len(), 4);
    }

    #[test]
    fn cull_keeps_highest_difficulty_when_address_distance_dominates() {
        // node_id sits one bit away from the author's address-key, so every entry's address
        // distance is the same tiny constant, near-certainly smaller than its (effectively
        // random) change-hash distance. That makes the weighted order depend purely on
        // proof-of-work difficulty.
        let author = Ed25519KeyPair::generate();
        let mut node_id_bytes = *Key::from_address(&author.address()).as_bytes();
        node_id_bytes[15] ^= 0x01;
        let node_id = Key::new(node_id_bytes);
        let mut storage = Storage::new(node_id, 10);

        for level in 1..=10u32 {
            for i in 0..10u32 {
                let change = make_change(
                    &author,
                    "guarantor.schemas:GenericDocument",
                    "reset",
                    serde_json::json!({"title": format!("{level}-{i}"), "props": {}}),
                    None,
                    None,
                    level,
                )
                .unwrap();
                let key = Key::from_change_id(&change.change_id);
                storage.set(key, &dumps_change(&change));
            }
        }

        assert_eq!(storage.len(), 10);
        for entry in &storage.entries {
            let difficulty = get_pow_difficulty(&entry.change.change_id, &entry.change.proof_of_work).unwrap();
            assert!(difficulty >= 10.0, "surviving entry should be from the top difficulty level: {difficulty}");
        }
    }

    #[test]
    fn random_20_byte_key_never_matches_a_real_change_id() {
        let mut storage = Storage::new(Key::from_bytes(b"node"), 10);
        let change = signed_change(2);
        let random_key = Key::new([0xAB; 20]);
        assert!(!storage.set(random_key, &dumps_change(&change)));
        assert_eq!(storage.len(), 0);
    }

    proptest! {
        /// Property 8: a value stored under a key that isn't `SHA1(change_id)` never gets stored,
        /// for any mismatched key and difficulty.
        #[test]
        fn drop_law_rejects_any_mismatched_key(difficulty in 0u32..4, garbage_key in any::<[u8; 20]>()) {
            let change = signed_change(difficulty);
            let real_key = Key::from_change_id(&change.change_id);
            prop_assume!(Key::new(garbage_key) != real_key);

            let mut storage = Storage::new(Key::from_bytes(b"node"), 10);
            prop_assert!(!storage.set(Key::new(garbage_key), &dumps_change(&change)));
            prop_assert_eq!(storage.len(), 0);
        }

        /// Property 9: whatever mix of difficulties is inserted, `cull` never leaves more than
        /// `max_entries` survivors.
        #[test]
        fn cull_bounds_storage_size(
            max_entries in 1usize..8,
            difficulties in prop::collection::vec(0u32..6, 1..20),
        ) {
            let author = Ed25519KeyPair::generate();
            let mut storage = Storage::new(Key::from_bytes(b"node"), max_entries);
            for (i, difficulty) in difficulties.iter().enumerate() {
                let change = make_change(
                    &author,
                    "guarantor.schemas:GenericDocument",
                    "reset",
                    serde_json::json!({"title": format!("v{i}"), "props": {}}),
                    None,
                    None,
                    *difficulty,
                )
                .unwrap();
                let key = Key::from_change_id(&change.change_id);
                storage.set(key, &dumps_change(&change));
            }
            prop_assert!(storage.len() <= max_entries);
        }

        /// Property 10: other things equal (same change id, so the same key/address distance to
        /// any node), a higher-difficulty entry never weighs heavier than a lower-difficulty one.
        #[test]
        fn higher_difficulty_never_weighs_more(difficulty_lo in 0u32..4, extra in 1u32..4) {
            let difficulty_hi = difficulty_lo + extra;
            let author = Ed25519KeyPair::generate();
            let opdata = serde_json::json!({"title": "x", "props": {}});
            let change_lo = make_change(
                &author,
                "guarantor.schemas:GenericDocument",
                "reset",
                opdata.clone(),
                None,
                None,
                difficulty_lo,
            )
            .unwrap();
            let change_hi = make_change(
                &author,
                "guarantor.schemas:GenericDocument",
                "reset",
                opdata,
                None,
                None,
                difficulty_hi,
            )
            .unwrap();
            // identical id-fields (address/doctype/opcode/opdata/parent) mean identical change_id,
            // so both entries sit at exactly the same key/address distance from any node.
            prop_assert_eq!(&change_lo.change_id, &change_hi.change_id);

            let node_id = Key::from_bytes(b"some-node");
            let entry_lo = Entry {
                key: Key::from_change_id(&change_lo.change_id),
                address_key: Key::from_address(&change_lo.address),
                change: change_lo,
            };
            let entry_hi = Entry {
                key: Key::from_change_id(&change_hi.change_id),
                address_key: Key::from_address(&change_hi.address),
                change: change_hi,
            };
            prop_assert!(weighted(&entry_hi, &node_id) <= weighted(&entry_lo, &node_id));
        }
    }
}
