//! The data-access layer: ties the change model, the doc-diff engine, the KV store and the
//! in-memory index together into `new`/`get`/`update`/`save`/`find` semantics over typed
//! documents.
mod error;
mod wrapper;

pub use crate::error::DalError;
pub use crate::wrapper::Wrapper;

use guarantor_change::{make_change, Change, ChangeId};
use guarantor_crypto::KeyPair;
use guarantor_docdiff::{build_document, Identity};
use guarantor_docdiff::GenericDocument;
use guarantor_kvstore::Store;
use serde_json::Value;

fn register_default_fields() {
    guarantor_index::declare_fields(Identity::DOCTYPE, &["address", "props.name", "props.email"]);
    guarantor_index::declare_fields(GenericDocument::DOCTYPE, &["title"]);
}

/// Ties a [`Store`] and a PoW difficulty floor to the change model, doc-diff engine and index,
/// giving callers `new`/`get`/`find` over typed documents instead of raw changes.
pub struct Dal {
    store: Store,
    difficulty: u32,
}

impl Dal {
    pub fn new(store: Store, difficulty: u32) -> Self {
        register_default_fields();
        Self { store, difficulty }
    }

    pub(crate) fn store(&self) -> &Store {
        &self.store
    }

    pub(crate) fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Creates a root change resetting a new document to `fields`, authored by `key`. The
    /// returned wrapper is unsaved: `committed_changes` is empty, `staged_changes` holds the one
    /// root change.
    pub fn create(&self, key: &dyn KeyPair, doctype: &str, fields: Value) -> Result<Wrapper, DalError> {
        let change = make_change(key, doctype, "reset", fields, None, None, self.difficulty)?;
        let doc = build_document(std::slice::from_ref(&change))?;
        Ok(Wrapper::new(doc, Vec::new(), vec![change]))
    }

    /// Walks `head`'s ancestor chain, replays it into a typed document, and returns a wrapper
    /// whose `committed_changes` is the whole chain (ascending `rev`) and `staged_changes` is
    /// empty. A chain that fails to replay is a [`DalError::CorruptChain`].
    pub fn get(&self, head: &ChangeId) -> Result<Wrapper, DalError> {
        let mut chain: Vec<Change> = self
            .store
            .iter_changes(head, false)
            .collect::<Result<_, _>>()?;
        chain.sort_by(|a, b| a.rev.cmp(&b.rev).then_with(|| a.change_id.cmp(&b.change_id)));

        let doc = build_document(&chain)
            .map_err(|e| DalError::CorruptChain(format!("{head}: {e}")))?;
        Ok(Wrapper::new(doc, chain, Vec::new()))
    }

    /// Searches `doctype`'s index for each `(field, term)` pair in `search`, loads every matching
    /// head via [`Dal::get`], and returns the one with the largest `head_rev`, or `None` if
    /// nothing matched. `search` must be non-empty and every field must be declared for
    /// `doctype`, or this returns [`DalError::InvalidQuery`].
    pub fn find_one(&self, doctype: &str, search: &[(&str, &str)]) -> Result<Option<Wrapper>, DalError> {
        let mut best: Option<Wrapper> = None;
        for wrapper in self.find(doctype, search)? {
            if best.as_ref().is_none_or(|b| wrapper.head_rev() > b.head_rev()) {
                best = Some(wrapper);
            }
        }
        Ok(best)
    }

    /// Searches `doctype`'s index for each `(field, term)` pair in `search` and loads every
    /// matching head via [`Dal::get`], in index order. Matches are not deduplicated across
    /// `search` entries; callers that care should dedup by [`Wrapper::head`].
    pub fn find(&self, doctype: &str, search: &[(&str, &str)]) -> Result<Vec<Wrapper>, DalError> {
        if search.is_empty() {
            return Err(DalError::InvalidQuery("search must name at least one field".to_owned()));
        }
        let declared = guarantor_index::declared_fields(doctype);
        let mut wrappers = Vec::new();
        for (field, term) in search {
            if !declared.iter().any(|f| f == field) {
                return Err(DalError::InvalidQuery(format!(
                    "field {field} is not declared for doctype {doctype}"
                )));
            }
            for hit in guarantor_index::query_index(doctype, term, Some(&[field])) {
                wrappers.push(self.get(&hit.change_id)?);
            }
        }
        Ok(wrappers)
    }
}
