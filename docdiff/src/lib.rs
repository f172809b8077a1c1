//! Replays a document's change chain into a typed value.
//!
//! Every [`guarantor_change::Change`] carries an opaque `(opcode, opdata)` pair; this crate gives
//! that pair meaning — folding a chain of them into a document, and tagging the result against a
//! process-wide doctype registry so callers that only know a doctype string at runtime (the DAL,
//! the HTTP facade) can still get a validated document back.
mod diff;
mod document;
mod error;
mod operation;
mod registry;

pub use crate::diff::{apply_diffs, build_document, make_diff};
pub use crate::document::{GenericDocument, Identity};
pub use crate::error::DocDiffError;
pub use crate::operation::{Opcode, Operation};
pub use crate::registry::{build as build_document_from_fields, register_doctype, BuiltDocument};
