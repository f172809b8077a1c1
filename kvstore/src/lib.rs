//! An append-only, content-addressed store of [`Change`]s, embedded via `sled`.
//!
//! The external contract is a single logical map from `change_id` to `Change`; sharding the
//! backing tree by a prefix of `change_id` is a pure internal optimization implementations may
//! add later without breaking callers, which is why `iter_changes` never hands out anything more
//! specific than a `change_id`-keyed walk.
mod error;

pub use crate::error::KvStoreError;

use guarantor_change::{dumps_change, verify_change, Change, ChangeId};
use std::path::Path;

/// Whether a [`Store`] was opened for writing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    ReadOnly,
    ReadWrite,
}

/// A handle onto one `sled` tree of changes, opened once per `db_dir` and cheaply cloneable
/// (sled trees are themselves reference-counted).
#[derive(Clone)]
pub struct Store {
    tree: sled::Tree,
    mode: Mode,
}

impl Store {
    pub fn open(db_dir: impl AsRef<Path>, mode: Mode) -> Result<Self, KvStoreError> {
        let db = sled::open(db_dir)?;
        let tree = db.open_tree("changes")?;
        Ok(Self { tree, mode })
    }

    /// Opens an in-memory store, for tests and scratch use.
    pub fn open_temporary(mode: Mode) -> Result<Self, KvStoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        let tree = db.open_tree("changes")?;
        Ok(Self { tree, mode })
    }

    /// Verifies and persists `change`. Refuses if the store is read-only, or if a change with
    /// the same `change_id` is already stored with different bytes (exact-bytes equality).
    pub fn post(&self, change: &Change) -> Result<(), KvStoreError> {
        if self.mode != Mode::ReadWrite {
            return Err(KvStoreError::ReadOnly);
        }
        if !verify_change(change) {
            return Err(KvStoreError::Verification(change.change_id.to_string()));
        }

        let key = change.change_id.as_str().as_bytes();
        let encoded = dumps_change(change);
        if let Some(existing) = self.tree.get(key)? {
            if existing.as_ref() != encoded.as_slice() {
                return Err(KvStoreError::Conflict(change.change_id.to_string()));
            }
            return Ok(());
        }
        self.tree.insert(key, encoded)?;
        tracing::debug!(change_id = %change.change_id, "posted change");
        Ok(())
    }

    /// Looks up `change_id`, verifying it before returning. `None` if absent.
    pub fn get(&self, change_id: &ChangeId) -> Result<Option<Change>, KvStoreError> {
        let Some(bytes) = self.tree.get(change_id.as_str().as_bytes())? else {
            return Ok(None);
        };
        let change: Change = serde_json::from_slice(&bytes)?;
        if !verify_change(&change) {
            return Err(KvStoreError::Verification(change_id.to_string()));
        }
        Ok(Some(change))
    }

    /// Walks `parent_id` backward from `head`, yielding each change newest-first. If
    /// `early_exit`, stops right after yielding a change whose opcode is `reset` (a valid chain
    /// terminus).
    pub fn iter_changes<'a>(
        &'a self,
        head: &ChangeId,
        early_exit: bool,
    ) -> impl Iterator<Item = Result<Change, KvStoreError>> + 'a {
        ChangeWalk {
            store: self,
            next: Some(head.clone()),
            early_exit,
            done: false,
        }
    }
}

struct ChangeWalk<'a> {
    store: &'a Store,
    next: Option<ChangeId>,
    early_exit: bool,
    done: bool,
}

impl Iterator for ChangeWalk<'_> {
    type Item = Result<Change, KvStoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.next.take()?;
        match self.store.get(&current) {
            Ok(Some(change)) => {
                if self.early_exit && change.opcode == "reset" {
                    self.done = true;
                } else {
                    self.next = change.parent_id.clone();
                }
                Some(Ok(change))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
