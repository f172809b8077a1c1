use crate::error::DalError;
use crate::Dal;
use guarantor_change::{make_change, Change, ChangeId, Rev};
use guarantor_crypto::KeyPair;
use guarantor_docdiff::{build_document, make_diff, BuiltDocument};
use serde_json::{Map, Value};

/// A transactional view over one document's change chain.
///
/// `committed_changes` have been posted to the store; `staged_changes` have not. The invariant
/// `build_document(committed ++ staged) == doc` holds after every call into this type — `update`
/// recomputes `doc` as it appends to `staged`, and `save` only moves entries from `staged` to
/// `committed` without touching `doc`.
///
/// Per the cyclic-ownership note in this codebase's design: a `Wrapper` never stores a strong
/// reference back to its [`Dal`]; every mutating method takes one as a borrowed argument.
pub struct Wrapper {
    pub doc: BuiltDocument,
    pub committed_changes: Vec<Change>,
    pub staged_changes: Vec<Change>,
}

impl Wrapper {
    pub(crate) fn new(doc: BuiltDocument, committed_changes: Vec<Change>, staged_changes: Vec<Change>) -> Self {
        Self {
            doc,
            committed_changes,
            staged_changes,
        }
    }

    /// The change-id of the most recent change in this chain, staged or committed.
    pub fn head(&self) -> &ChangeId {
        &self.last().change_id
    }

    /// The `rev` of [`Wrapper::head`].
    pub fn head_rev(&self) -> &Rev {
        &self.last().rev
    }

    fn last(&self) -> &Change {
        self.staged_changes
            .last()
            .or_else(|| self.committed_changes.last())
            .expect("a Wrapper always has at least one change")
    }

    /// Computes a diff from the wrapper's current document to `old fields` merged with `fields`,
    /// wraps it as a new change chained onto [`Wrapper::head`], and appends it to `staged_changes`.
    pub fn update(
        &mut self,
        dal: &Dal,
        key: &dyn KeyPair,
        fields: Value,
    ) -> Result<(), DalError> {
        let old = self.doc.fields().clone();
        let merged = merge_fields(&old, fields);
        let op = make_diff(&old, &merged);

        let parent_id = self.head().clone();
        let parent_rev = self.head_rev().clone();
        let change = make_change(
            key,
            self.doc.doctype(),
            op.opcode.as_str(),
            op.opdata,
            Some(parent_id),
            Some(parent_rev),
            dal.difficulty(),
        )?;

        let mut all_changes = self.committed_changes.clone();
        all_changes.extend(self.staged_changes.clone());
        all_changes.push(change.clone());
        self.doc = build_document(&all_changes)?;
        self.staged_changes.push(change);
        Ok(())
    }

    /// Posts every staged change to the store in order, then refreshes the document index.
    ///
    /// On error nothing is mutated: `committed_changes`/`staged_changes` stay exactly as they
    /// were before the call, so the caller may retry or inspect the wrapper unharmed.
    pub fn save(&mut self, dal: &Dal) -> Result<(), DalError> {
        for change in &self.staged_changes {
            dal.store().post(change)?;
        }
        let head = self.head().clone();
        guarantor_index::update_indexes(self.doc.doctype(), &head, self.doc.fields());
        self.committed_changes.append(&mut self.staged_changes);
        tracing::debug!(head = %head, "saved wrapper");
        Ok(())
    }
}

/// Shallow-merges `changes`'s top-level keys into `old`, overwriting any key `old` already had.
/// This is what backs `Wrapper::update`'s `**changes`-style keyword update: callers name only the
/// fields they want to change, not the whole document.
fn merge_fields(old: &Value, changes: Value) -> Value {
    let mut merged = old.as_object().cloned().unwrap_or_else(Map::new);
    if let Value::Object(changes) = changes {
        for (k, v) in changes {
            merged.insert(k, v);
        }
    }
    Value::Object(merged)
}
