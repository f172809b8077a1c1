//! A Kademlia-style storage overlay for changes, dual-keyed by `SHA1(change_id)` and
//! `SHA1(change.address)`, so any participant can both resolve a specific change and enumerate
//! everything a given author has published.
mod error;
mod key;
mod mock;
mod node;
mod storage;
mod transport;

pub use crate::error::DhtError;
pub use crate::key::{Distance, Key};
pub use crate::mock::MockNetwork;
pub use crate::node::{Node, PublishOutcome, RetryPolicy};
pub use crate::storage::Storage;
pub use crate::transport::DhtTransport;
