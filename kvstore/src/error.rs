/// Errors raised by the append-only change store.
#[derive(Debug, thiserror::Error)]
pub enum KvStoreError {
    #[error("store I/O error: {0}")]
    StoreIo(#[from] sled::Error),
    #[error("change failed verification on read: {0}")]
    Verification(String),
    #[error("store was opened read-only")]
    ReadOnly,
    #[error("change {0} already exists with different content")]
    Conflict(String),
    #[error("stored change is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}
