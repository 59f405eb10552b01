use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KetchupError {
    #[error("malformed snapshot stream at offset {offset}: {reason}")]
    MalformedStream { offset: u64, reason: String },

    #[error("collection name cannot be encoded: {0:?}")]
    UnencodableName(String),

    #[error("snapshot file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KetchupError {
    pub(crate) fn malformed(offset: u64, reason: impl Into<String>) -> Self {
        Self::MalformedStream {
            offset,
            reason: reason.into(),
        }
    }
}

pub type KetchupResult<T> = Result<T, KetchupError>;
