//! `guarantor`: the facade crate tying together the peer-to-peer identity/document fabric's
//! component crates — crypto, change, doc-diff, KV store, index, DAL and DHT overlay — plus the
//! ambient configuration and logging this codebase's entrypoints share.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, ConfigError, DhtConfig};
pub use error::GuarantorError;

pub use guarantor_change as change;
pub use guarantor_crypto as crypto;
pub use guarantor_dal as dal;
pub use guarantor_dht as dht;
pub use guarantor_docdiff as docdiff;
pub use guarantor_index as index;
pub use guarantor_kvstore as kvstore;

use guarantor_dal::Dal;
use guarantor_kvstore::{Mode, Store};
use std::sync::Arc;

/// Opens the KV store and DAL named by `config`. The DHT overlay is wired up separately (it needs
/// a transport and a peer set that vary by deployment); this only gets a node talking to its own
/// local store.
pub fn open_dal(config: &Config, mode: Mode) -> Result<Dal, GuarantorError> {
    let store = Store::open(&config.store_dir, mode)?;
    Ok(Dal::new(store, config.difficulty))
}

/// Builds the DHT storage this node advertises, sized per `config.dht.max_entries`.
pub fn open_dht_storage(config: &Config, node_id: guarantor_dht::Key) -> Arc<std::sync::Mutex<guarantor_dht::Storage>> {
    Arc::new(std::sync::Mutex::new(guarantor_dht::Storage::new(node_id, config.dht.max_entries)))
}
