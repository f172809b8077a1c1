use crate::error::DocDiffError;
use crate::operation::{Opcode, Operation};
use crate::registry::BuiltDocument;
use guarantor_change::Change;
use serde_json::Value;

/// Always returns `Operation(reset, new)`. Structural diffing (`dictdiff`) is left unimplemented —
/// every change this codebase authors replaces the whole document.
pub fn make_diff(_old: &Value, new: &Value) -> Operation {
    Operation {
        opcode: Opcode::Reset,
        opdata: new.clone(),
    }
}

/// Folds `ops` over `old`, oldest-first. `reset` replaces the document outright; `dictdiff`,
/// `set` and `del` are recognized opcodes with no encoder behind them, so applying one is always
/// an error rather than a silent no-op.
pub fn apply_diffs(old: &Value, ops: &[Operation]) -> Result<Value, DocDiffError> {
    let mut doc = old.clone();
    for op in ops {
        match op.opcode {
            Opcode::Reset => doc = op.opdata.clone(),
            Opcode::DictDiff | Opcode::Set | Opcode::Del => {
                return Err(DocDiffError::UnsupportedOperation(op.opcode.to_string()))
            }
        }
    }
    Ok(doc)
}

/// Replays a document's full change chain into its typed document.
///
/// `changes` need not already be sorted: this sorts by `rev` ascending, breaking ties by full
/// `change_id` (a `rev` collision on its embedded 8-hex-char tiebreaker is possible in principle
/// even though vanishingly unlikely), then applies oldest-to-newest starting from `{}`.
pub fn build_document(changes: &[Change]) -> Result<BuiltDocument, DocDiffError> {
    let mut ordered: Vec<&Change> = changes.iter().collect();
    ordered.sort_by(|a, b| a.rev.cmp(&b.rev).then_with(|| a.change_id.cmp(&b.change_id)));

    let last = ordered.last().ok_or(DocDiffError::EmptyChain)?;
    let doctype = last.doctype.clone();

    let ops = ordered
        .iter()
        .map(|c| Operation::from_parts(&c.opcode, c.opdata.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    let fields = apply_diffs(&Value::Object(Default::default()), &ops)?;
    crate::registry::build(&doctype, fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use guarantor_change::{make_change, Change};
    use guarantor_crypto::Ed25519KeyPair;
    use proptest::prelude::*;

    /// Builds a chain of 2-6 `reset` changes, one author, each naming the last as parent — the
    /// shape `build_document` replays.
    fn arb_chain() -> impl Strategy<Value = Vec<Change>> {
        prop::collection::vec("[a-z]{1,8}", 2..6).prop_map(|titles| {
            let key = Ed25519KeyPair::generate();
            let mut chain = Vec::new();
            let mut parent: Option<(guarantor_change::ChangeId, guarantor_change::Rev)> = None;
            for title in titles {
                let opdata = serde_json::json!({"title": title, "props": {}});
                let (parent_id, parent_rev) = match &parent {
                    None => (None, None),
                    Some((id, rev)) => (Some(id.clone()), Some(rev.clone())),
                };
                let change = make_change(
                    &key,
                    "guarantor.schemas:GenericDocument",
                    "reset",
                    opdata,
                    parent_id,
                    parent_rev,
                    2,
                )
                .unwrap();
                parent = Some((change.change_id.clone(), change.rev.clone()));
                chain.push(change);
            }
            chain
        })
    }

    /// Pairs a chain with a shuffling of itself, the shuffle generated by sorting against an
    /// independently-drawn key per element — an order `build_document`'s own sort never controls.
    fn arb_chain_and_shuffle() -> impl Strategy<Value = (Vec<Change>, Vec<Change>)> {
        arb_chain().prop_flat_map(|chain| {
            let n = chain.len();
            prop::collection::vec(any::<u32>(), n).prop_map(move |keys| {
                let mut paired: Vec<(u32, Change)> = keys.into_iter().zip(chain.clone()).collect();
                paired.sort_by_key(|(k, _)| *k);
                let shuffled: Vec<Change> = paired.into_iter().map(|(_, c)| c).collect();
                (chain.clone(), shuffled)
            })
        })
    }

    proptest! {
        /// Property 5: replay determinism — `build_document` of any shuffling of a chain agrees
        /// with `build_document` of the chain in its original order.
        #[test]
        fn replay_is_order_independent((chain, shuffled) in arb_chain_and_shuffle()) {
            let original = build_document(&chain).unwrap();
            let reordered = build_document(&shuffled).unwrap();
            prop_assert_eq!(original.fields(), reordered.fields());
            prop_assert_eq!(original.doctype(), reordered.doctype());
        }
    }

    #[test]
    fn apply_diffs_replaces_on_reset() {
        let old = serde_json::json!({"a": 1});
        let ops = vec![Operation {
            opcode: Opcode::Reset,
            opdata: serde_json::json!({"b": 2}),
        }];
        assert_eq!(apply_diffs(&old, &ops).unwrap(), serde_json::json!({"b": 2}));
    }

    #[test]
    fn apply_diffs_rejects_dictdiff() {
        let old = serde_json::json!({});
        let ops = vec![Operation {
            opcode: Opcode::DictDiff,
            opdata: serde_json::json!([]),
        }];
        assert!(matches!(
            apply_diffs(&old, &ops),
            Err(DocDiffError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn build_document_replays_a_chain() {
        let key = Ed25519KeyPair::generate();
        let c1 = make_change(
            &key,
            "guarantor.schemas:GenericDocument",
            "reset",
            serde_json::json!({"title": "first", "props": {}}),
            None,
            None,
            2,
        )
        .unwrap();
        let c2 = make_change(
            &key,
            "guarantor.schemas:GenericDocument",
            "reset",
            serde_json::json!({"title": "second", "props": {}}),
            Some(c1.change_id.clone()),
            Some(c1.rev.clone()),
            2,
        )
        .unwrap();

        // pass out of order; build_document must sort before replaying
        let doc = build_document(&[c2, c1]).unwrap();
        let generic = doc.into_generic_document().unwrap();
        assert_eq!(generic.title, "second");
    }

    #[test]
    fn build_document_rejects_empty_chain() {
        assert!(matches!(build_document(&[]), Err(DocDiffError::EmptyChain)));
    }
}
