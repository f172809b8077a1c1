use crate::error::DhtError;
use crate::key::Key;
use crate::storage::Storage;
use crate::transport::DhtTransport;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// An in-memory [`DhtTransport`] that dispatches an RPC straight into the target peer's
/// [`Storage`] instead of opening a socket, so [`crate::Node`]'s publish/lookup/cull behavior is
/// testable without a real network.
#[derive(Clone, Default)]
pub struct MockNetwork {
    peers: Arc<Mutex<HashMap<Key, PeerHandle>>>,
}

struct PeerHandle {
    storage: Arc<Mutex<Storage>>,
    known_peers: Vec<Key>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a peer's storage and its static set of known peer ids (this mock's stand-in for
    /// a real routing table), so other peers' `find_node` calls can discover it.
    pub fn register(&self, id: Key, storage: Arc<Mutex<Storage>>, known_peers: Vec<Key>) {
        self.peers.lock().unwrap().insert(id, PeerHandle { storage, known_peers });
    }

    pub fn storage_of(&self, id: Key) -> Option<Arc<Mutex<Storage>>> {
        self.peers.lock().unwrap().get(&id).map(|p| p.storage.clone())
    }
}

#[async_trait]
impl DhtTransport for MockNetwork {
    async fn find_node(&self, peer: Key, target: Key) -> Result<Vec<Key>, DhtError> {
        let peers = self.peers.lock().unwrap();
        let handle = peers
            .get(&peer)
            .ok_or_else(|| DhtError::Network(format!("unknown peer {peer}")))?;
        let mut known = handle.known_peers.clone();
        known.sort_by_key(|k| k.distance(&target));
        Ok(known)
    }

    async fn store(&self, peer: Key, key: Key, value: Vec<u8>) -> Result<bool, DhtError> {
        let storage = {
            let peers = self.peers.lock().unwrap();
            peers
                .get(&peer)
                .ok_or_else(|| DhtError::Network(format!("unknown peer {peer}")))?
                .storage
                .clone()
        };
        let stored = storage.lock().unwrap().set(key, &value);
        Ok(stored)
    }

    async fn find_value(&self, peer: Key, key: Key) -> Result<Option<Vec<u8>>, DhtError> {
        let storage = {
            let peers = self.peers.lock().unwrap();
            peers
                .get(&peer)
                .ok_or_else(|| DhtError::Network(format!("unknown peer {peer}")))?
                .storage
                .clone()
        };
        let bytes = storage.lock().unwrap().get_bytes(&key);
        Ok(bytes)
    }

    async fn get_changes(
        &self,
        peer: Key,
        address_digest: Key,
        after_key: Option<Key>,
        ksize: usize,
    ) -> Result<Vec<Key>, DhtError> {
        let storage = {
            let peers = self.peers.lock().unwrap();
            peers
                .get(&peer)
                .ok_or_else(|| DhtError::Network(format!("unknown peer {peer}")))?
                .storage
                .clone()
        };
        let changes = storage.lock().unwrap().get_changes(&address_digest, after_key.as_ref(), ksize);
        Ok(changes)
    }
}
