use std::collections::BTreeMap;

use crate::document::{Document, DocumentId, Revision};
use crate::error::TypeError;

/// Longest accepted collection name.
pub const MAX_NAME_LEN: usize = 128;

/// Revision history of a single document, keyed by revision number.
pub type History = BTreeMap<Revision, Document>;

/// A named set of documents with their full revision history.
///
/// For every identity the stored revisions are `1..=n` without gaps when the
/// collection is only written through [`Collection::save`]. [`Collection::put`]
/// bypasses revision assignment and exists for snapshot import.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Collection {
    name: String,
    documents: BTreeMap<DocumentId, History>,
}

impl Collection {
    /// Create an empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: BTreeMap::new(),
        }
    }

    /// Rebuild a collection from stored documents, keeping their revisions.
    pub fn from_documents(
        name: impl Into<String>,
        documents: impl IntoIterator<Item = Document>,
    ) -> Self {
        let mut collection = Self::new(name);
        for document in documents {
            collection.put(document);
        }
        collection
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check that `name` can be used as a collection name.
    ///
    /// Names are 1 to [`MAX_NAME_LEN`] characters from `A-Z a-z 0-9 _ . -`,
    /// other than `.` and `..`, so they embed in a URL path unescaped.
    pub fn validate_name(name: &str) -> Result<(), TypeError> {
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-');
        if name.is_empty()
            || name.len() > MAX_NAME_LEN
            || name == "."
            || name == ".."
            || !name.chars().all(allowed)
        {
            return Err(TypeError::InvalidCollectionName(name.to_string()));
        }
        Ok(())
    }

    /// Store a new revision of `document`.
    ///
    /// An unseen identity gets revision 1, otherwise the revision is the
    /// number of existing revisions plus one. The revision carried by the
    /// input is ignored. Returns the stored document.
    pub fn save(&mut self, document: Document) -> Document {
        let history = self.documents.entry(document.id).or_default();
        let revision = history.len() as Revision + 1;
        let stored = document.with_revision(revision);
        history.insert(revision, stored.clone());
        stored
    }

    /// Store `document` under its exact `(id, revision)`, replacing whatever
    /// was there.
    pub fn put(&mut self, document: Document) {
        self.documents
            .entry(document.id)
            .or_default()
            .insert(document.revision, document);
    }

    /// The highest stored revision of a document.
    pub fn current(&self, id: &DocumentId) -> Option<&Document> {
        self.documents
            .get(id)
            .and_then(|history| history.last_key_value())
            .map(|(_, doc)| doc)
    }

    /// A specific revision of a document.
    pub fn revision(&self, id: &DocumentId, revision: Revision) -> Option<&Document> {
        self.documents.get(id).and_then(|history| history.get(&revision))
    }

    /// Full revision history of a document.
    pub fn history(&self, id: &DocumentId) -> Option<&History> {
        self.documents.get(id)
    }

    /// Remove a document and every one of its revisions.
    ///
    /// Returns `true` if the document existed.
    pub fn remove(&mut self, id: &DocumentId) -> bool {
        self.documents.remove(id).is_some()
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.documents.contains_key(id)
    }

    /// Stored documents in iteration order.
    ///
    /// With `include_all_revisions` every revision of every document is
    /// returned; otherwise only the highest revision of each.
    pub fn documents(&self, include_all_revisions: bool) -> Vec<Document> {
        if include_all_revisions {
            self.iter().cloned().collect()
        } else {
            self.documents
                .values()
                .filter_map(|history| history.last_key_value())
                .map(|(_, doc)| doc.clone())
                .collect()
        }
    }

    /// Every stored revision, ordered by identity then revision.
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.values().flat_map(|history| history.values())
    }

    /// Number of distinct documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if the collection holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of stored revisions across all documents.
    pub fn revision_count(&self) -> usize {
        self.documents.values().map(BTreeMap::len).sum()
    }

    /// The first identity whose revisions are not exactly `1..=n`, together
    /// with the lowest revision missing from it.
    pub fn first_gap(&self) -> Option<(DocumentId, Revision)> {
        self.documents.iter().find_map(|(id, history)| {
            history
                .keys()
                .zip(1..)
                .find(|(stored, expected)| **stored != *expected)
                .map(|(_, expected)| (*id, expected))
        })
    }

    /// Remove every document.
    pub fn clear(&mut self) {
        self.documents.clear();
    }
}
