//! Directory of storage engines, keyed by collection name.
//!
//! [`EngineRegistry`] keeps its engines in a `HashMap` behind a `RwLock`.
//! Lookups take the read lock; create, install and remove take the write
//! lock, so create-if-absent is atomic. Engines are handed out as `Arc`s:
//! removing a collection only drops the registry's handle, and its worker
//! stops once the last handle is gone.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::info;

use pragma_types::Collection;

use crate::engine::StorageEngine;
use crate::error::{EngineError, EngineResult};

/// Name → engine directory shared by all request handlers.
pub struct EngineRegistry {
    engines: RwLock<HashMap<String, Arc<StorageEngine>>>,
}

impl EngineRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            engines: RwLock::new(HashMap::new()),
        }
    }

    /// Return the engine for `name`, creating an empty collection if none
    /// exists yet.
    pub fn create_or_get(&self, name: &str) -> EngineResult<Arc<StorageEngine>> {
        if let Some(engine) = self.find(name) {
            return Ok(engine);
        }
        let mut engines = self.engines.write().expect("lock poisoned");
        if let Some(engine) = engines.get(name) {
            return Ok(Arc::clone(engine));
        }
        let engine = Arc::new(StorageEngine::new(name)?);
        engines.insert(name.to_string(), Arc::clone(&engine));
        info!(collection = name, "created collection");
        Ok(engine)
    }

    /// Register an existing collection, such as an imported snapshot.
    ///
    /// Fails with [`EngineError::AlreadyExists`] if the name is taken, and
    /// with [`EngineError::RevisionGap`] if some document's revisions are not
    /// exactly `1..=n`, since later inserts would overwrite stored revisions.
    pub fn install(&self, collection: Collection) -> EngineResult<Arc<StorageEngine>> {
        if let Some((id, missing)) = collection.first_gap() {
            return Err(EngineError::RevisionGap {
                collection: collection.name().to_string(),
                id,
                missing,
            });
        }
        let mut engines = self.engines.write().expect("lock poisoned");
        if engines.contains_key(collection.name()) {
            return Err(EngineError::AlreadyExists(collection.name().to_string()));
        }
        let name = collection.name().to_string();
        let documents = collection.len();
        let engine = Arc::new(StorageEngine::start(collection)?);
        engines.insert(name.clone(), Arc::clone(&engine));
        info!(collection = %name, documents, "installed collection");
        Ok(engine)
    }

    /// Look up the engine for `name`.
    pub fn find(&self, name: &str) -> Option<Arc<StorageEngine>> {
        self.engines
            .read()
            .expect("lock poisoned")
            .get(name)
            .cloned()
    }

    /// Remove a collection. Returns `true` if it existed.
    ///
    /// Nothing is written anywhere: the collection's contents are gone once
    /// outstanding handles are dropped.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self
            .engines
            .write()
            .expect("lock poisoned")
            .remove(name)
            .is_some();
        if removed {
            info!(collection = name, "removed collection");
        }
        removed
    }

    /// Sorted names of all registered collections.
    pub fn list_names(&self) -> Vec<String> {
        let engines = self.engines.read().expect("lock poisoned");
        let mut names: Vec<String> = engines.keys().cloned().collect();
        names.sort();
        names
    }

    /// Remove every collection. Returns how many were removed.
    pub fn purge(&self) -> usize {
        let mut engines = self.engines.write().expect("lock poisoned");
        let count = engines.len();
        engines.clear();
        count
    }

    /// Number of registered collections.
    pub fn len(&self) -> usize {
        self.engines.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no collection is registered.
    pub fn is_empty(&self) -> bool {
        self.engines.read().expect("lock poisoned").is_empty()
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("collections", &self.list_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pragma_types::Document;
    use std::thread;

    use crate::command::Command;

    // -----------------------------------------------------------------------
    // Create / find / remove
    // -----------------------------------------------------------------------

    #[test]
    fn create_then_find() {
        let registry = EngineRegistry::new();
        let engine = registry.create_or_get("foo").unwrap();
        assert_eq!(engine.name(), "foo");

        let found = registry.find("foo").expect("should exist");
        assert!(Arc::ptr_eq(&engine, &found));
    }

    #[test]
    fn create_is_idempotent() {
        let registry = EngineRegistry::new();
        let first = registry.create_or_get("foo").unwrap();
        let second = registry.create_or_get("foo").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn find_missing_returns_none() {
        let registry = EngineRegistry::new();
        assert!(registry.find("nope").is_none());
    }

    #[test]
    fn remove_present_and_missing() {
        let registry = EngineRegistry::new();
        registry.create_or_get("foo").unwrap();
        assert!(registry.remove("foo"));
        assert!(registry.find("foo").is_none());
        assert!(!registry.remove("foo"));
    }

    #[test]
    fn recreate_after_remove_is_empty() {
        let registry = EngineRegistry::new();
        let engine = registry.create_or_get("foo").unwrap();
        let (command, reply) = Command::insert(Document::text("x"));
        engine.accept(command);
        reply.wait().unwrap();
        registry.remove("foo");

        let fresh = registry.create_or_get("foo").unwrap();
        let (command, reply) = Command::get_all(true);
        fresh.accept(command);
        assert!(reply.wait().unwrap().is_empty());
    }

    #[test]
    fn removed_engine_keeps_serving_outstanding_handles() {
        let registry = EngineRegistry::new();
        let engine = registry.create_or_get("foo").unwrap();
        registry.remove("foo");

        let (command, reply) = Command::insert(Document::text("late"));
        engine.accept(command);
        assert_eq!(reply.wait().unwrap().revision, 1);
    }

    // -----------------------------------------------------------------------
    // Listing / purge
    // -----------------------------------------------------------------------

    #[test]
    fn list_names_is_sorted() {
        let registry = EngineRegistry::new();
        assert!(registry.list_names().is_empty());
        for name in ["gamma", "alpha", "beta"] {
            registry.create_or_get(name).unwrap();
        }
        assert_eq!(registry.list_names(), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn purge_removes_all() {
        let registry = EngineRegistry::new();
        registry.create_or_get("a").unwrap();
        registry.create_or_get("b").unwrap();
        assert_eq!(registry.purge(), 2);
        assert!(registry.is_empty());
    }

    // -----------------------------------------------------------------------
    // Install
    // -----------------------------------------------------------------------

    #[test]
    fn install_serves_existing_documents() {
        let registry = EngineRegistry::new();
        let mut collection = Collection::new("imported");
        let stored = collection.save(Document::text("a"));

        let engine = registry.install(collection).unwrap();
        let (command, reply) = Command::get_one(stored.id, None);
        engine.accept(command);
        assert_eq!(reply.wait().unwrap(), stored);
    }

    #[test]
    fn install_rejects_revision_gap() {
        let registry = EngineRegistry::new();
        let id = pragma_types::DocumentId::new();
        let mut collection = Collection::new("gappy");
        collection.put(Document::from_parts(id, 3, pragma_types::MediaType::TextPlain, "x"));
        collection.put(Document::from_parts(id, 5, pragma_types::MediaType::TextPlain, "y"));

        let err = registry.install(collection).unwrap_err();
        assert!(matches!(err, EngineError::RevisionGap { id: gap, missing: 1, .. } if gap == id));
        assert!(registry.find("gappy").is_none());
    }

    #[test]
    fn insert_after_install_appends_next_revision() {
        let registry = EngineRegistry::new();
        let mut collection = Collection::new("imported");
        let first = collection.save(Document::text("a1"));
        collection.save(first.with_content("a2"));
        let engine = registry.install(collection).unwrap();

        let (command, reply) = Command::insert(first.with_content("a3"));
        engine.accept(command);
        let stored = reply.wait().unwrap();
        assert_eq!(stored.revision, 3);

        let (command, reply) = Command::get_one(first.id, Some(1));
        engine.accept(command);
        assert_eq!(&reply.wait().unwrap().content[..], b"a1");

        let (command, reply) = Command::get_one(first.id, None);
        engine.accept(command);
        assert_eq!(reply.wait().unwrap(), stored);
    }

    #[test]
    fn install_rejects_taken_name() {
        let registry = EngineRegistry::new();
        registry.create_or_get("taken").unwrap();
        let err = registry.install(Collection::new("taken")).unwrap_err();
        assert!(matches!(err, EngineError::AlreadyExists(name) if name == "taken"));
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_create_yields_single_engine() {
        let registry = Arc::new(EngineRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.create_or_get("shared").unwrap())
            })
            .collect();

        let engines: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .collect();
        assert_eq!(registry.len(), 1);
        for engine in &engines[1..] {
            assert!(Arc::ptr_eq(&engines[0], engine));
        }
    }

    #[test]
    fn debug_lists_collections() {
        let registry = EngineRegistry::default();
        registry.create_or_get("x").unwrap();
        let debug = format!("{registry:?}");
        assert!(debug.contains("EngineRegistry"));
        assert!(debug.contains("x"));
    }
}
