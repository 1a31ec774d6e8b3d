#[allow(missing_docs)]
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid keypath: {0}")]
    InvalidKeypath(String),

    #[error("Unsupported network, chain id: {0}")]
    UnsupportedChainId(u64),

    #[error("Invalid coin: {0}")]
    InvalidCoin(String),

    #[error("Signature must be {expected} bytes, got {got}")]
    InvalidSignatureLength { expected: usize, got: usize },

    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),
}
