use crate::document::{GenericDocument, Identity};
use crate::error::DocDiffError;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

type Validator = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

static REGISTRY: Lazy<RwLock<BTreeMap<String, Validator>>> = Lazy::new(|| {
    let mut map: BTreeMap<String, Validator> = BTreeMap::new();
    map.insert(
        Identity::DOCTYPE.to_owned(),
        Arc::new(|v| serde_json::from_value::<Identity>(v.clone()).map(|_| ()).map_err(|e| e.to_string())),
    );
    map.insert(
        GenericDocument::DOCTYPE.to_owned(),
        Arc::new(|v| {
            serde_json::from_value::<GenericDocument>(v.clone())
                .map(|_| ())
                .map_err(|e| e.to_string())
        }),
    );
    RwLock::new(map)
});

/// Registers a schema validator for `doctype`, replacing any validator already registered under
/// that name. `guarantor.schemas:Identity` and `guarantor.schemas:GenericDocument` are registered
/// by default; calling this for either one overrides the built-in check.
pub fn register_doctype<F>(doctype: &str, validator: F)
where
    F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
{
    REGISTRY.write().insert(doctype.to_owned(), Arc::new(validator));
}

/// A replayed document: its doctype name plus the raw field map produced by replaying its
/// change chain. Use [`BuiltDocument::into_identity`] / [`into_generic_document`] to recover a
/// concrete type, or match on [`BuiltDocument::doctype`] for a caller-defined one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BuiltDocument {
    doctype: String,
    fields: Value,
}

impl BuiltDocument {
    pub fn doctype(&self) -> &str {
        &self.doctype
    }

    pub fn fields(&self) -> &Value {
        &self.fields
    }

    pub fn into_identity(self) -> Result<Identity, DocDiffError> {
        self.into_typed()
    }

    pub fn into_generic_document(self) -> Result<GenericDocument, DocDiffError> {
        self.into_typed()
    }

    fn into_typed<T: serde::de::DeserializeOwned>(self) -> Result<T, DocDiffError> {
        serde_json::from_value(self.fields).map_err(|e| DocDiffError::SchemaMismatch {
            doctype: self.doctype,
            reason: e.to_string(),
        })
    }
}

/// Looks up `doctype`'s validator, checks `fields` against it, and wraps the result.
pub fn build(doctype: &str, fields: Value) -> Result<BuiltDocument, DocDiffError> {
    let validator = REGISTRY
        .read()
        .get(doctype)
        .cloned()
        .ok_or_else(|| DocDiffError::UnknownDoctype(doctype.to_owned()))?;
    validator(&fields).map_err(|reason| DocDiffError::SchemaMismatch {
        doctype: doctype.to_owned(),
        reason,
    })?;
    Ok(BuiltDocument {
        doctype: doctype.to_owned(),
        fields,
    })
}
