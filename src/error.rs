/// The unifying error taxonomy from this codebase's design notes (§7): every component error maps
/// into one of these variants, and the HTTP façade maps each variant to a status code.
///
/// Component crates keep their own narrower `thiserror` enums; this type exists at the
/// orchestration layer (API, CLI) where callers need one taxonomy to match on and report.
#[derive(Debug, thiserror::Error)]
pub enum GuarantorError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("verification error: {0}")]
    Verification(String),
    #[error("store I/O error: {0}")]
    StoreIo(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("corrupt chain: {0}")]
    CorruptChain(String),
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl From<guarantor_change::ChangeError> for GuarantorError {
    fn from(e: guarantor_change::ChangeError) -> Self {
        use guarantor_change::ChangeError::*;
        match e {
            Validation(msg) => GuarantorError::Validation(msg),
            Verification(msg) => GuarantorError::Verification(msg),
        }
    }
}

impl From<guarantor_docdiff::DocDiffError> for GuarantorError {
    fn from(e: guarantor_docdiff::DocDiffError) -> Self {
        GuarantorError::Validation(e.to_string())
    }
}

impl From<guarantor_kvstore::KvStoreError> for GuarantorError {
    fn from(e: guarantor_kvstore::KvStoreError) -> Self {
        GuarantorError::StoreIo(e.to_string())
    }
}

impl From<guarantor_dal::DalError> for GuarantorError {
    fn from(e: guarantor_dal::DalError) -> Self {
        use guarantor_dal::DalError::*;
        match e {
            StoreIo(inner) => GuarantorError::StoreIo(inner.to_string()),
            DocDiff(inner) => GuarantorError::Validation(inner.to_string()),
            Change(inner) => inner.into(),
            InvalidQuery(msg) => GuarantorError::Validation(msg),
            CorruptChain(msg) => GuarantorError::CorruptChain(msg),
        }
    }
}

impl From<guarantor_dht::DhtError> for GuarantorError {
    fn from(e: guarantor_dht::DhtError) -> Self {
        GuarantorError::Network(e.to_string())
    }
}

impl GuarantorError {
    /// The HTTP status this error maps to, per §7: `ValidationError`/`VerificationError`→400,
    /// `CorruptChain`/`StoreIOError`→500, `NetworkError`→504, `UnsupportedOperation`→501.
    pub fn status_code(&self) -> u16 {
        match self {
            GuarantorError::Validation(_) => 400,
            GuarantorError::Verification(_) => 400,
            GuarantorError::StoreIo(_) => 500,
            GuarantorError::CorruptChain(_) => 500,
            GuarantorError::Network(_) => 504,
            GuarantorError::UnsupportedOperation(_) => 501,
        }
    }
}
