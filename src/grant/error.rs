//! Errors produced while issuing or verifying access grants.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrantError {
    /// Malformed or missing request parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The shared secret is unavailable or signing failed.
    #[error("signing error: {0}")]
    SigningError(String),

    /// `exp` has elapsed.
    #[error("grant has expired")]
    Expired,

    #[error("grant signature is invalid")]
    InvalidSignature,

    /// Token could not be decoded or its claims do not match the editor schema.
    #[error("malformed grant: {0}")]
    Malformed(String),
}

impl GrantError {
    /// Short, stable label used in API error bodies and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            GrantError::InvalidInput(_) => "invalid_input",
            GrantError::SigningError(_) => "signing_error",
            GrantError::Expired => "expired",
            GrantError::InvalidSignature => "invalid_signature",
            GrantError::Malformed(_) => "malformed",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for GrantError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => GrantError::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                GrantError::InvalidSignature
            }
            _ => GrantError::Malformed(err.to_string()),
        }
    }
}

pub type GrantResult<T> = std::result::Result<T, GrantError>;
