use crate::error::DhtError;
use crate::key::Key;
use async_trait::async_trait;

/// The peer-to-peer RPC surface this overlay's protocol augmentation is built on.
///
/// Modeled as an async trait so [`crate::Node`]'s store/lookup/cull behavior is fully testable
/// against an in-memory [`crate::mock::MockNetwork`] without opening a socket. A production
/// deployment wires this to `libp2p`'s request-response protocol; shipping that wiring is out of
/// scope here (this codebase's Non-goal on a fully defined federation protocol), only the trait
/// boundary is.
#[async_trait]
pub trait DhtTransport: Send + Sync {
    /// Asks `peer` for the `k` nodes (by id) it knows that are closest to `target`.
    async fn find_node(&self, peer: Key, target: Key) -> Result<Vec<Key>, DhtError>;

    /// Stores `value` under `key` at `peer`. Returns whether `peer` acknowledged.
    async fn store(&self, peer: Key, key: Key, value: Vec<u8>) -> Result<bool, DhtError>;

    /// Fetches the change stored at `key` on `peer`, if any.
    async fn find_value(&self, peer: Key, key: Key) -> Result<Option<Vec<u8>>, DhtError>;

    /// The address-scoped enumeration RPC: asks `peer` for up to `ksize` keys of changes it
    /// holds that were authored by `address_digest`, strictly after `after_key` when given.
    async fn get_changes(
        &self,
        peer: Key,
        address_digest: Key,
        after_key: Option<Key>,
        ksize: usize,
    ) -> Result<Vec<Key>, DhtError>;
}
