use thiserror::Error;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Email is required")]
    Empty,

    #[error("Email must be between {min} and {max} characters, got {actual}")]
    InvalidLength { min: usize, max: usize, actual: usize },
}

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username is required")]
    Empty,

    #[error("Username too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Username too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Error for password policy failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password is required")]
    Empty,

    #[error("Password must be at least {min} characters long")]
    TooShort { min: usize },
}

/// Reason a presented token was refused.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TokenRejection {
    #[error("malformed")]
    Malformed,

    #[error("bad signature")]
    BadSignature,

    #[error("unexpected algorithm")]
    AlgorithmMismatch,

    #[error("expired")]
    Expired,

    #[error("not yet valid")]
    NotYetValid,

    #[error("invalid subject")]
    InvalidSubject,
}

impl From<&auth::TokenError> for TokenRejection {
    fn from(err: &auth::TokenError) -> Self {
        match err {
            auth::TokenError::InvalidSignature => TokenRejection::BadSignature,
            auth::TokenError::AlgorithmMismatch => TokenRejection::AlgorithmMismatch,
            auth::TokenError::Malformed(_) | auth::TokenError::EncodingFailed(_) => {
                TokenRejection::Malformed
            }
        }
    }
}

/// Top-level error for credential and token operations
#[derive(Debug, Clone, Error)]
pub enum CredentialError {
    // Input validation errors (automatically converted via #[from])
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid password: {0}")]
    InvalidPassword(#[from] PasswordPolicyError),

    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    // Domain-level errors
    #[error("User already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(TokenRejection),

    #[error("User not found")]
    UserNotFound,

    // Infrastructure errors
    #[error("Credential store timed out")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for CredentialError {
    fn from(err: anyhow::Error) -> Self {
        CredentialError::Internal(err.to_string())
    }
}
