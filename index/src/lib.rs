//! An in-memory, prefix-searchable index over document field terms.
//!
//! One sorted list of [`IndexItem`] is kept per `(doctype, field)` pair, fed by a pending buffer
//! that batches inserts so `save()` never pays for a re-sort per field per change. The whole
//! thing is a process-wide singleton behind a single writer / many readers lock, the same shape
//! `guarantor_docdiff::registry` uses for its doctype table.
mod terms;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use guarantor_change::ChangeId;

/// One `(stem, change_id)` entry in the index: `stem` is a single expanded search term, and
/// `change_id` names the change whose replayed document produced it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexItem {
    pub stem: String,
    pub change_id: ChangeId,
}

impl IndexItem {
    fn key(&self) -> (&str, &str) {
        (&self.stem, self.change_id.as_str())
    }
}

type FieldKey = (String, String);

#[derive(Default)]
struct IndexState {
    declared: BTreeMap<String, Vec<String>>,
    sorted: BTreeMap<FieldKey, Vec<IndexItem>>,
    pending: BTreeMap<FieldKey, Vec<IndexItem>>,
}

static INDEX: Lazy<RwLock<IndexState>> = Lazy::new(|| RwLock::new(IndexState::default()));

/// Declares which dotted field paths of `doctype` are indexed, replacing any prior declaration.
pub fn declare_fields(doctype: &str, field_paths: &[&str]) {
    INDEX
        .write()
        .declared
        .insert(doctype.to_owned(), field_paths.iter().map(|f| f.to_string()).collect());
}

/// Returns the field paths declared for `doctype`, if any.
pub fn declared_fields(doctype: &str) -> Vec<String> {
    INDEX.read().declared.get(doctype).cloned().unwrap_or_default()
}

/// Extracts each declared field of `doctype` from `doc`, expands it to its term set, and appends
/// `(term, change_id)` to the pending buffer for that `(doctype, field)`. A no-op if `doctype`
/// has no declared fields.
pub fn update_indexes(doctype: &str, change_id: &ChangeId, doc: &Value) {
    let mut state = INDEX.write();
    let Some(fields) = state.declared.get(doctype).cloned() else {
        return;
    };
    for field in fields {
        let Some(value) = terms::extract_field(doc, &field) else {
            continue;
        };
        let stems = terms::expand_terms(value);
        let bucket = state.pending.entry((doctype.to_owned(), field)).or_default();
        for stem in stems {
            bucket.push(IndexItem {
                stem,
                change_id: change_id.clone(),
            });
        }
    }
    tracing::debug!(%doctype, %change_id, "updated indexes");
}

/// Merges any pending items into `doctype`'s sorted per-field lists, then returns every item
/// across the searched fields whose stem starts with `search_term`, in ascending
/// `(stem, change_id)` order. `fields`, if given, restricts the search to those field paths;
/// otherwise every field declared for `doctype` is searched.
pub fn query_index(doctype: &str, search_term: &str, fields: Option<&[&str]>) -> Vec<IndexItem> {
    let mut state = INDEX.write();
    let declared = state.declared.get(doctype).cloned().unwrap_or_default();
    let search_fields: Vec<String> = match fields {
        Some(f) => f.iter().map(|s| s.to_string()).collect(),
        None => declared,
    };

    let mut hits = Vec::new();
    for field in search_fields {
        let key = (doctype.to_owned(), field);
        if let Some(pending) = state.pending.remove(&key) {
            let sorted = state.sorted.entry(key.clone()).or_default();
            sorted.extend(pending);
            sorted.sort_by(|a, b| a.key().cmp(&b.key()));
        }
        let Some(sorted) = state.sorted.get(&key) else {
            continue;
        };
        let start = sorted.partition_point(|item| item.stem.as_str() < search_term);
        for item in &sorted[start..] {
            if !item.stem.starts_with(search_term) {
                break;
            }
            hits.push(item.clone());
        }
    }

    hits.sort_by(|a, b| a.key().cmp(&b.key()));
    tracing::trace!(%doctype, %search_term, hits = hits.len(), "query_index");
    hits
}
