/// Errors raised while diffing, patching or replaying a document chain.
#[derive(Debug, thiserror::Error)]
pub enum DocDiffError {
    #[error("opcode not implemented: {0}")]
    UnsupportedOperation(String),
    #[error("unknown opcode: {0}")]
    UnknownOpcode(String),
    #[error("unregistered doctype: {0}")]
    UnknownDoctype(String),
    #[error("document does not match doctype {doctype}: {reason}")]
    SchemaMismatch { doctype: String, reason: String },
    #[error("empty change chain")]
    EmptyChain,
}
