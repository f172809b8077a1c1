use crate::pow::calculate_pow;
use crate::{ChangeError, ChangeId, Rev};
use guarantor_crypto::{canonical_hash, Address, KeyPair};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Difficulty above which this codebase refuses to mine or accept a change; the spec's Python
/// prototype asserts `difficulty < 40` in `schemas.py`.
pub const MAX_DIFFICULTY: u32 = 40;

/// The persisted unit of mutation: a signed, content-addressed, proof-of-worked document edit.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub address: Address,
    pub doctype: String,
    pub opcode: String,
    pub opdata: Value,
    pub parent_id: Option<ChangeId>,
    pub change_id: ChangeId,
    pub rev: Rev,
    pub signature: Vec<u8>,
    pub proof_of_work: String,
}

fn id_fields(
    address: &Address,
    doctype: &str,
    opcode: &str,
    opdata: &Value,
    parent_id: Option<&ChangeId>,
) -> Value {
    serde_json::json!({
        "address": address.to_string(),
        "doctype": doctype,
        "opcode": opcode,
        "opdata": opdata,
        "parent_id": parent_id.map(ChangeId::as_str),
    })
}

/// Wraps `opdata` into a new, signed, proof-of-worked [`Change`] authored by `key`.
///
/// `parent_id`/`parent_rev` must either both be `None` (a root change) or both be `Some` — a
/// change that names a parent id without a parent rev (or vice versa) can't have its `rev`
/// computed and is rejected.
#[allow(clippy::too_many_arguments)]
pub fn make_change(
    key: &dyn KeyPair,
    doctype: &str,
    opcode: &str,
    opdata: Value,
    parent_id: Option<ChangeId>,
    parent_rev: Option<Rev>,
    difficulty: u32,
) -> Result<Change, ChangeError> {
    if difficulty >= MAX_DIFFICULTY {
        return Err(ChangeError::Validation(format!(
            "difficulty {difficulty} >= cap {MAX_DIFFICULTY}"
        )));
    }
    if parent_id.is_some() != parent_rev.is_some() {
        return Err(ChangeError::Validation(
            "parent_id and parent_rev must both be set or both be absent".to_owned(),
        ));
    }

    let address = key.address();
    let fields = id_fields(&address, doctype, opcode, &opdata, parent_id.as_ref());
    let change_id = ChangeId::new(canonical_hash(&fields));

    let rev = match &parent_rev {
        None => Rev::root(doctype, &change_id),
        Some(parent_rev) => parent_rev.increment(doctype, &change_id)?,
    };

    let mut message = change_id.as_str().to_owned();
    message.push_str(rev.as_str());
    let signature = key.sign(message.as_bytes());

    let proof_of_work = calculate_pow(&change_id, difficulty);
    tracing::debug!(%change_id, %doctype, %opcode, "made change");

    Ok(Change {
        address,
        doctype: doctype.to_owned(),
        opcode: opcode.to_owned(),
        opdata,
        parent_id,
        change_id,
        rev,
        signature,
        proof_of_work,
    })
}

/// Recomputes `change_id` from `c`'s id-fields and checks its signature over `change_id || rev`.
///
/// Never inspects `proof_of_work`: PoW is admission policy for stores and the DHT, not part of
/// what makes a change authentic.
pub fn verify_change(c: &Change) -> bool {
    let fields = id_fields(&c.address, &c.doctype, &c.opcode, &c.opdata, c.parent_id.as_ref());
    let expected_id = canonical_hash(&fields);
    if expected_id != c.change_id.as_str() {
        return false;
    }
    let mut message = c.change_id.as_str().to_owned();
    message.push_str(c.rev.as_str());
    guarantor_crypto::verify(&c.address, &c.signature, message.as_bytes())
}

/// Serializes `change` to its canonical wire bytes (JSON).
pub fn dumps_change(change: &Change) -> Vec<u8> {
    serde_json::to_vec(change).expect("Change always serializes")
}

/// Deserializes and verifies a change; fails with [`ChangeError::Verification`] if the signature
/// or change-id don't check out.
pub fn loads_change(bytes: &[u8]) -> Result<Change, ChangeError> {
    let change: Change = serde_json::from_slice(bytes)
        .map_err(|e| ChangeError::Validation(format!("malformed change JSON: {e}")))?;
    if !verify_change(&change) {
        return Err(ChangeError::Verification(change.change_id.to_string()));
    }
    Ok(change)
}
