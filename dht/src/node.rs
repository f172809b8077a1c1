use crate::error::DhtError;
use crate::key::Key;
use crate::storage::Storage;
use crate::transport::DhtTransport;
use guarantor_change::{dumps_change, Change};
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Caller-side cancellation/timeout policy for every DHT RPC: a per-call timeout with exponential
/// back-off on retry, capped at a fixed attempt count.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            max_retries: 5,
        }
    }
}

async fn retrying<T, Fut, F>(policy: &RetryPolicy, mut attempt_call: F) -> Result<T, DhtError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DhtError>>,
{
    let mut attempt = 0u32;
    loop {
        match tokio::time::timeout(policy.timeout, attempt_call()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(_)) | Err(_) if attempt < policy.max_retries => {
                let backoff_ms = 100u64.saturating_mul(1u64 << attempt.min(20));
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                attempt += 1;
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(DhtError::Network("timed out after retries".to_owned())),
        }
    }
}

/// The outcome of [`Node::publish`]: how many peers were asked to store the change, and how many
/// acknowledged. `store` is considered successful if `acked > 0`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PublishOutcome {
    pub attempted: usize,
    pub acked: usize,
}

impl PublishOutcome {
    pub fn succeeded(&self) -> bool {
        self.acked > 0
    }
}

/// A Kademlia participant: its own [`Storage`], a transport to talk to peers, and a flat list of
/// known peer ids standing in for a full k-bucket routing table (acceptable per this codebase's
/// Non-goal on a fully defined federation protocol — see `DESIGN.md`).
pub struct Node {
    id: Key,
    storage: Arc<Mutex<Storage>>,
    transport: Arc<dyn DhtTransport>,
    known_peers: Vec<Key>,
    ksize: usize,
    alpha: usize,
    retry: RetryPolicy,
}

impl Node {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Key,
        storage: Arc<Mutex<Storage>>,
        transport: Arc<dyn DhtTransport>,
        known_peers: Vec<Key>,
        ksize: usize,
        alpha: usize,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            id,
            storage,
            transport,
            known_peers,
            ksize,
            alpha,
            retry,
        }
    }

    pub fn id(&self) -> Key {
        self.id
    }

    pub fn storage(&self) -> Arc<Mutex<Storage>> {
        self.storage.clone()
    }

    /// The iterative Kademlia node lookup: starting from known peers, repeatedly asks the
    /// `alpha` not-yet-queried peers closest to `target` for their own closest peers, merging
    /// newly learned ones, until a round brings no peer closer than the best already known.
    /// Returns up to `ksize` peers, closest-first.
    pub async fn lookup(&self, target: Key) -> Vec<Key> {
        let mut shortlist = self.known_peers.clone();
        shortlist.sort_by_key(|k| k.distance(&target));

        let mut queried: HashSet<Key> = HashSet::new();
        let mut best = shortlist.first().copied();

        loop {
            let round: Vec<Key> = shortlist
                .iter()
                .filter(|k| !queried.contains(*k))
                .take(self.alpha)
                .copied()
                .collect();
            if round.is_empty() {
                break;
            }

            let mut improved = false;
            for peer in round {
                queried.insert(peer);
                let found = retrying(&self.retry, || self.transport.find_node(peer, target)).await;
                if let Ok(found) = found {
                    for candidate in found {
                        if candidate != self.id && !shortlist.contains(&candidate) {
                            shortlist.push(candidate);
                            improved = true;
                        }
                    }
                }
            }

            shortlist.sort_by_key(|k| k.distance(&target));
            let new_best = shortlist.first().copied();
            if !improved || new_best == best {
                break;
            }
            best = new_best;
        }

        shortlist.truncate(self.ksize);
        shortlist
    }

    /// Stores `change` locally, then publishes it to the `ksize` peers closest to
    /// `SHA1(change_id)` AND to the `ksize` peers closest to `SHA1(change.address)` — the
    /// protocol augmentation that lets any participant later enumerate an address's changes via
    /// [`Node::get_changes_remote`] on any of those peers.
    pub async fn publish(&self, change: &Change) -> PublishOutcome {
        let change_key = Key::from_change_id(&change.change_id);
        let address_key = Key::from_address(&change.address);
        self.storage.lock().unwrap().set(change_key, &dumps_change(change));

        let mut peers: Vec<Key> = self.lookup(change_key).await;
        for peer in self.lookup(address_key).await {
            if !peers.contains(&peer) {
                peers.push(peer);
            }
        }

        let value = dumps_change(change);
        let attempted = peers.len();
        let mut acked = 0;
        for peer in peers {
            let value = value.clone();
            let result = retrying(&self.retry, || self.transport.store(peer, change_key, value.clone())).await;
            if matches!(result, Ok(true)) {
                acked += 1;
            }
        }
        tracing::debug!(change_id = %change.change_id, attempted, acked, "published change");
        PublishOutcome { attempted, acked }
    }

    /// Looks up `key` locally, falling back to asking the peers closest to it.
    pub async fn get(&self, key: Key) -> Option<Change> {
        if let Some(change) = self.storage.lock().unwrap().get(&key) {
            return Some(change);
        }
        for peer in self.lookup(key).await {
            if let Ok(Some(bytes)) = retrying(&self.retry, || self.transport.find_value(peer, key)).await {
                if let Ok(change) = guarantor_change::loads_change(&bytes) {
                    return Some(change);
                }
            }
        }
        None
    }

    /// Serves the `get_changes` RPC locally: every key this node holds whose change was authored
    /// by `address_digest`, ascending, strictly after `after_key`.
    pub fn get_changes_local(&self, address_digest: &Key, after_key: Option<&Key>) -> Vec<Key> {
        self.storage.lock().unwrap().get_changes(address_digest, after_key, self.ksize)
    }

    /// Asks `peer` for its `get_changes(address_digest, after_key)` result.
    pub async fn get_changes_remote(
        &self,
        peer: Key,
        address_digest: Key,
        after_key: Option<Key>,
    ) -> Result<Vec<Key>, DhtError> {
        retrying(&self.retry, || self.transport.get_changes(peer, address_digest, after_key, self.ksize)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockNetwork;
    use guarantor_change::make_change;
    use guarantor_crypto::{Ed25519KeyPair, KeyPair};

    fn node(id: Key, net: &MockNetwork, known: Vec<Key>) -> Node {
        let storage = Arc::new(Mutex::new(Storage::new(id, 100)));
        net.register(id, storage.clone(), known.clone());
        Node::new(id, storage, Arc::new(net.clone()), known, 20, 3, RetryPolicy::default())
    }

    #[tokio::test]
    async fn publish_stores_locally_and_at_peers() {
        let net = MockNetwork::new();
        let id_a = Key::from_bytes(b"a");
        let id_b = Key::from_bytes(b"b");
        let id_c = Key::from_bytes(b"c");

        let a = node(id_a, &net, vec![id_b, id_c]);
        let _b = node(id_b, &net, vec![id_a, id_c]);
        let _c = node(id_c, &net, vec![id_a, id_b]);

        let key = Ed25519KeyPair::generate();
        let change = make_change(
            &key,
            "guarantor.schemas:GenericDocument",
            "reset",
            serde_json::json!({"title": "hi", "props": {}}),
            None,
            None,
            2,
        )
        .unwrap();

        let outcome = a.publish(&change).await;
        assert!(outcome.succeeded());

        let change_key = Key::from_change_id(&change.change_id);
        assert!(net.storage_of(id_b).unwrap().lock().unwrap().get(&change_key).is_some());
        assert!(net.storage_of(id_c).unwrap().lock().unwrap().get(&change_key).is_some());
    }

    #[tokio::test]
    async fn get_changes_remote_enumerates_by_address() {
        let net = MockNetwork::new();
        let id_a = Key::from_bytes(b"a");
        let id_b = Key::from_bytes(b"b");
        let a = node(id_a, &net, vec![id_b]);
        let b = node(id_b, &net, vec![id_a]);

        let author = Ed25519KeyPair::generate();
        let change = make_change(
            &author,
            "guarantor.schemas:GenericDocument",
            "reset",
            serde_json::json!({"title": "hi", "props": {}}),
            None,
            None,
            2,
        )
        .unwrap();
        a.publish(&change).await;

        let address_digest = Key::from_address(&author.address());
        let listed = b.get_changes_remote(id_a, address_digest, None).await.unwrap();
        assert!(listed.contains(&Key::from_change_id(&change.change_id)));
    }
}
