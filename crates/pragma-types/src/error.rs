use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("invalid document identity: {0}")]
    InvalidIdentity(String),

    #[error("invalid collection name: {0:?}")]
    InvalidCollectionName(String),
}
