/// Errors raised by the DHT storage overlay and its transport.
#[derive(Debug, thiserror::Error)]
pub enum DhtError {
    #[error("peer unreachable or timed out: {0}")]
    Network(String),
    #[error("no peer acknowledged the store")]
    StoreFailed,
}
