use bytes::Bytes;
use pragma_types::{Document, DocumentId, Revision};

use crate::error::{EngineError, EngineResult};
use crate::reply::{slot, Reply, Responder};

/// A request to a [`StorageEngine`](crate::StorageEngine), paired with the
/// slot its outcome is delivered to.
///
/// Build commands with the constructors: each returns the command together
/// with the [`Reply`] to observe, or, for the `*_then` variants, takes a
/// continuation instead.
///
/// Continuations run inline on the engine's worker thread. They must not
/// block on another [`Reply`] with [`Reply::wait`]: a reply from the same
/// engine can never complete while its worker is parked in the continuation.
/// Submit follow-up commands with their own `*_then` continuation instead.
#[derive(Debug)]
pub enum Command {
    /// Store a new revision of a document.
    Insert {
        document: Document,
        responder: Responder<Document>,
    },
    /// Store the next revision of an existing document with new content,
    /// optionally only if its current revision is `expected_revision`.
    Update {
        id: DocumentId,
        content: Bytes,
        expected_revision: Option<Revision>,
        responder: Responder<Document>,
    },
    /// Remove a document with its whole history.
    Delete {
        id: DocumentId,
        responder: Responder<()>,
    },
    /// Fetch one revision, or the current one when `revision` is `None`.
    GetOne {
        id: DocumentId,
        revision: Option<Revision>,
        responder: Responder<Document>,
    },
    /// Fetch every document, either at its current revision or with all
    /// revisions flattened.
    GetAll {
        include_all_revisions: bool,
        responder: Responder<Vec<Document>>,
    },
}

impl Command {
    pub fn insert(document: Document) -> (Self, Reply<Document>) {
        let (responder, reply) = slot();
        (
            Self::Insert {
                document,
                responder,
            },
            reply,
        )
    }

    pub fn insert_then(
        document: Document,
        then: impl FnOnce(EngineResult<Document>) + Send + 'static,
    ) -> Self {
        Self::Insert {
            document,
            responder: Responder::callback(then),
        }
    }

    pub fn update(
        id: DocumentId,
        content: impl Into<Bytes>,
        expected_revision: Option<Revision>,
    ) -> (Self, Reply<Document>) {
        let (responder, reply) = slot();
        (
            Self::Update {
                id,
                content: content.into(),
                expected_revision,
                responder,
            },
            reply,
        )
    }

    pub fn update_then(
        id: DocumentId,
        content: impl Into<Bytes>,
        expected_revision: Option<Revision>,
        then: impl FnOnce(EngineResult<Document>) + Send + 'static,
    ) -> Self {
        Self::Update {
            id,
            content: content.into(),
            expected_revision,
            responder: Responder::callback(then),
        }
    }

    pub fn delete(id: DocumentId) -> (Self, Reply<()>) {
        let (responder, reply) = slot();
        (Self::Delete { id, responder }, reply)
    }

    pub fn delete_then(
        id: DocumentId,
        then: impl FnOnce(EngineResult<()>) + Send + 'static,
    ) -> Self {
        Self::Delete {
            id,
            responder: Responder::callback(then),
        }
    }

    pub fn get_one(id: DocumentId, revision: Option<Revision>) -> (Self, Reply<Document>) {
        let (responder, reply) = slot();
        (
            Self::GetOne {
                id,
                revision,
                responder,
            },
            reply,
        )
    }

    pub fn get_one_then(
        id: DocumentId,
        revision: Option<Revision>,
        then: impl FnOnce(EngineResult<Document>) + Send + 'static,
    ) -> Self {
        Self::GetOne {
            id,
            revision,
            responder: Responder::callback(then),
        }
    }

    pub fn get_all(include_all_revisions: bool) -> (Self, Reply<Vec<Document>>) {
        let (responder, reply) = slot();
        (
            Self::GetAll {
                include_all_revisions,
                responder,
            },
            reply,
        )
    }

    pub fn get_all_then(
        include_all_revisions: bool,
        then: impl FnOnce(EngineResult<Vec<Document>>) + Send + 'static,
    ) -> Self {
        Self::GetAll {
            include_all_revisions,
            responder: Responder::callback(then),
        }
    }

    /// Short name of the command kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::GetOne { .. } => "get-one",
            Self::GetAll { .. } => "get-all",
        }
    }

    /// Resolve the command with `error` without processing it.
    pub(crate) fn reject(self, error: EngineError) {
        match self {
            Self::Insert { responder, .. }
            | Self::Update { responder, .. }
            | Self::GetOne { responder, .. } => {
                responder.complete(Err(error));
            }
            Self::Delete { responder, .. } => {
                responder.complete(Err(error));
            }
            Self::GetAll { responder, .. } => {
                responder.complete(Err(error));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names() {
        let (insert, _) = Command::insert(Document::text("x"));
        let (update, _) = Command::update(DocumentId::new(), "y", None);
        let (delete, _) = Command::delete(DocumentId::new());
        let (get_one, _) = Command::get_one(DocumentId::new(), Some(1));
        let (get_all, _) = Command::get_all(true);
        assert_eq!(insert.kind(), "insert");
        assert_eq!(update.kind(), "update");
        assert_eq!(delete.kind(), "delete");
        assert_eq!(get_one.kind(), "get-one");
        assert_eq!(get_all.kind(), "get-all");
    }

    #[test]
    fn reject_resolves_reply_with_error() {
        let (command, reply) = Command::get_all(false);
        command.reject(EngineError::Shutdown("c".into()));
        assert!(matches!(reply.wait(), Err(EngineError::Shutdown(name)) if name == "c"));
    }

    #[test]
    fn reject_reaches_continuation() {
        let (tx, rx) = std::sync::mpsc::channel();
        let command = Command::delete_then(DocumentId::new(), move |outcome| {
            tx.send(outcome.is_err()).unwrap();
        });
        command.reject(EngineError::Dropped);
        assert!(rx.recv().unwrap());
    }
}
