use thiserror::Error;

/// Error type for token signing and parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token signature does not verify")]
    InvalidSignature,

    #[error("Token algorithm does not match the expected algorithm")]
    AlgorithmMismatch,
}
