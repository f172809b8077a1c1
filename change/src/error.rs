/// Errors raised while constructing, decoding or admitting a [`crate::Change`].
#[derive(Debug, thiserror::Error)]
pub enum ChangeError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("verification error: change {0} failed signature/hash verification")]
    Verification(String),
}
