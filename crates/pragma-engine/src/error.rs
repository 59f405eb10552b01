use pragma_types::{DocumentId, Revision};

/// Errors delivered through a command's reply, or raised by the registry.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The document, or the requested revision of it, does not exist.
    #[error("unknown document for id={id}{}", revision_suffix(.revision))]
    NotFound {
        id: DocumentId,
        revision: Option<Revision>,
    },

    /// An update expected a different current revision.
    #[error("revision conflict for id={id}: expected {expected}, current is {current}")]
    RevisionConflict {
        id: DocumentId,
        expected: Revision,
        current: Revision,
    },

    /// The engine's worker is no longer running.
    #[error("storage engine for collection {0} is shut down")]
    Shutdown(String),

    /// The reply slot was dropped without an outcome.
    #[error("command was dropped before it produced a result")]
    Dropped,

    /// A collection with this name is already registered.
    #[error("collection already exists: {0}")]
    AlreadyExists(String),

    /// An installed collection has a document whose revisions are not
    /// exactly `1..=n`.
    #[error("collection {collection} has a revision gap: id={id} is missing rev={missing}")]
    RevisionGap {
        collection: String,
        id: DocumentId,
        missing: Revision,
    },

    /// The worker thread could not be started.
    #[error("failed to start worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

fn revision_suffix(revision: &Option<Revision>) -> String {
    revision.map(|r| format!(" rev={r}")).unwrap_or_default()
}

impl EngineError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
