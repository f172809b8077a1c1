/// Errors raised by the data-access layer.
#[derive(Debug, thiserror::Error)]
pub enum DalError {
    #[error("store I/O error: {0}")]
    StoreIo(#[from] guarantor_kvstore::KvStoreError),
    #[error("document error: {0}")]
    DocDiff(#[from] guarantor_docdiff::DocDiffError),
    #[error("change error: {0}")]
    Change(#[from] guarantor_change::ChangeError),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("chain replay disagrees with stored head {0}")]
    CorruptChain(String),
}
