use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use pragma_types::{Collection, Document, DocumentId, Revision};

use crate::command::Command;
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Default)]
struct EngineStats {
    pending: AtomicUsize,
    processed: AtomicU64,
}

/// Sole owner and mutator of one [`Collection`].
///
/// Commands enter through an unbounded queue and are drained by a single
/// dedicated worker thread, in queue order, one at a time. The worker parks
/// on the queue while it is empty and stops once the engine is dropped and
/// the queue has been drained.
pub struct StorageEngine {
    name: String,
    intake: mpsc::UnboundedSender<Command>,
    stats: Arc<EngineStats>,
}

impl StorageEngine {
    /// Start an engine over an empty collection.
    pub fn new(name: impl Into<String>) -> EngineResult<Self> {
        Self::start(Collection::new(name))
    }

    /// Start an engine that takes ownership of `collection`.
    pub fn start(collection: Collection) -> EngineResult<Self> {
        let name = collection.name().to_string();
        let (intake, queue) = mpsc::unbounded_channel();
        let stats = Arc::new(EngineStats::default());

        let worker = Worker {
            collection,
            queue,
            stats: Arc::clone(&stats),
        };
        thread::Builder::new()
            .name(format!("pragma-engine-{}", name.replace('\0', "")))
            .spawn(move || worker.run())?;

        debug!(collection = %name, "storage engine started");
        Ok(Self {
            name,
            intake,
            stats,
        })
    }

    /// Name of the collection this engine owns.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a command for processing. Never blocks.
    pub fn accept(&self, command: Command) {
        let kind = command.kind();
        self.stats.pending.fetch_add(1, Ordering::AcqRel);
        if let Err(mpsc::error::SendError(command)) = self.intake.send(command) {
            self.stats.pending.fetch_sub(1, Ordering::AcqRel);
            warn!(collection = %self.name, kind, "worker gone, rejecting command");
            command.reject(EngineError::Shutdown(self.name.clone()));
            return;
        }
        debug!(collection = %self.name, kind, "added command to queue");
    }

    /// Queue several commands, preserving their order.
    pub fn accept_all(&self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.accept(command);
        }
    }

    /// Commands queued but not yet taken by the worker.
    pub fn pending(&self) -> usize {
        self.stats.pending.load(Ordering::Acquire)
    }

    /// Commands the worker has finished processing.
    pub fn processed(&self) -> u64 {
        self.stats.processed.load(Ordering::Acquire)
    }

    /// Insert `document` and wait for the stored revision.
    pub async fn insert(&self, document: Document) -> EngineResult<Document> {
        let (command, reply) = Command::insert(document);
        self.accept(command);
        reply.await
    }

    /// Store the next revision of `id` with new content.
    pub async fn update(
        &self,
        id: DocumentId,
        content: impl Into<Bytes>,
        expected_revision: Option<Revision>,
    ) -> EngineResult<Document> {
        let (command, reply) = Command::update(id, content, expected_revision);
        self.accept(command);
        reply.await
    }

    /// Delete `id` and its whole history.
    pub async fn delete(&self, id: DocumentId) -> EngineResult<()> {
        let (command, reply) = Command::delete(id);
        self.accept(command);
        reply.await
    }

    /// Fetch `id` at `revision`, or at its current revision.
    pub async fn get(&self, id: DocumentId, revision: Option<Revision>) -> EngineResult<Document> {
        let (command, reply) = Command::get_one(id, revision);
        self.accept(command);
        reply.await
    }

    /// Fetch every document.
    pub async fn get_all(&self, include_all_revisions: bool) -> EngineResult<Vec<Document>> {
        let (command, reply) = Command::get_all(include_all_revisions);
        self.accept(command);
        reply.await
    }

    /// A consistent copy of the whole collection, for export.
    pub async fn snapshot(&self) -> EngineResult<Collection> {
        let documents = self.get_all(true).await?;
        Ok(Collection::from_documents(self.name.clone(), documents))
    }
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("name", &self.name)
            .field("pending", &self.pending())
            .field("processed", &self.processed())
            .finish()
    }
}

struct Worker {
    collection: Collection,
    queue: mpsc::UnboundedReceiver<Command>,
    stats: Arc<EngineStats>,
}

impl Worker {
    fn run(mut self) {
        while let Some(command) = self.queue.blocking_recv() {
            self.stats.pending.fetch_sub(1, Ordering::AcqRel);
            self.process(command);
            self.stats.processed.fetch_add(1, Ordering::AcqRel);
        }
        info!(
            collection = %self.collection.name(),
            processed = self.stats.processed.load(Ordering::Acquire),
            "storage engine stopped"
        );
    }

    fn process(&mut self, command: Command) {
        let name = self.collection.name().to_string();
        let delivered = match command {
            Command::Insert {
                document,
                responder,
            } => {
                let stored = self.collection.save(document);
                debug!(collection = %name, id = %stored.id, revision = stored.revision, "inserted document");
                responder.complete(Ok(stored))
            }
            Command::Update {
                id,
                content,
                expected_revision,
                responder,
            } => {
                let outcome = self.update(id, content, expected_revision);
                if let Ok(stored) = &outcome {
                    debug!(collection = %name, id = %stored.id, revision = stored.revision, "updated document");
                }
                responder.complete(outcome)
            }
            Command::Delete { id, responder } => {
                let existed = self.collection.remove(&id);
                debug!(collection = %name, id = %id, existed, "deleted document");
                responder.complete(Ok(()))
            }
            Command::GetOne {
                id,
                revision,
                responder,
            } => {
                let found = match revision {
                    Some(revision) => self.collection.revision(&id, revision),
                    None => self.collection.current(&id),
                };
                let outcome = found
                    .cloned()
                    .ok_or(EngineError::NotFound { id, revision });
                responder.complete(outcome)
            }
            Command::GetAll {
                include_all_revisions,
                responder,
            } => responder.complete(Ok(self.collection.documents(include_all_revisions))),
        };
        if !delivered {
            debug!(collection = %name, "command outcome was not observed");
        }
    }

    fn update(
        &mut self,
        id: DocumentId,
        content: Bytes,
        expected_revision: Option<Revision>,
    ) -> EngineResult<Document> {
        let current = self
            .collection
            .current(&id)
            .ok_or(EngineError::NotFound { id, revision: None })?;
        if let Some(expected) = expected_revision {
            if expected != current.revision {
                return Err(EngineError::RevisionConflict {
                    id,
                    expected,
                    current: current.revision,
                });
            }
        }
        let next = current.with_content(content);
        Ok(self.collection.save(next))
    }
}
