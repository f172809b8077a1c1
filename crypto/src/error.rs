/// Errors this crate's boundary functions can return.
///
/// `verify` is deliberately excluded: per the spec it never throws, only ever returns `false`.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("invalid key")]
    InvalidKey,
}
