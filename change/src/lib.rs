//! The signed, content-addressed, proof-of-worked unit of mutation.
//!
//! A [`Change`] names its author by [`guarantor_crypto::Address`], carries an opaque
//! `(opcode, opdata)` payload interpreted by the doc-diff engine, and chains onto an optional
//! parent via `parent_id`/[`Rev`]. Its `change_id` is the canonical hash of everything but the
//! signature and proof of work, so tampering with any signed field is detectable without needing
//! the parent chain at hand.
mod change;
mod error;
mod id;
mod pow;
mod rev;

pub use crate::change::{dumps_change, loads_change, make_change, verify_change, Change, MAX_DIFFICULTY};
pub use crate::error::ChangeError;
pub use crate::id::ChangeId;
pub use crate::pow::{calculate_pow, calculate_pow_cancellable, get_pow_difficulty};
pub use crate::rev::Rev;
