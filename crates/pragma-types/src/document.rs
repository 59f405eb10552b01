use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;
use crate::media::MediaType;

/// Revision number of a stored document. Stored revisions start at 1.
pub type Revision = u64;

/// Revision carried by a document that has not been stored yet.
pub const UNSTORED_REVISION: Revision = 0;

/// Identity of a document, shared by all of its revisions (UUID v4).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a fresh random identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Short representation (first 8 characters of the UUID).
    pub fn short_id(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for DocumentId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| TypeError::InvalidIdentity(s.to_string()))
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.short_id())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One revision of a document.
///
/// Documents are values: storing a change never mutates an existing
/// `Document`, it produces a new one with the same [`DocumentId`] and the next
/// revision. Equality covers identity, revision and content bytes; the media
/// type does not take part.
#[derive(Clone)]
pub struct Document {
    pub id: DocumentId,
    pub revision: Revision,
    pub media_type: MediaType,
    pub content: Bytes,
}

impl Document {
    /// A new, not yet stored document with a fresh identity.
    pub fn new(media_type: MediaType, content: impl Into<Bytes>) -> Self {
        Self {
            id: DocumentId::new(),
            revision: UNSTORED_REVISION,
            media_type,
            content: content.into(),
        }
    }

    /// A JSON document with a fresh identity.
    pub fn json(content: impl Into<Bytes>) -> Self {
        Self::new(MediaType::ApplicationJson, content)
    }

    /// A plain-text document with a fresh identity.
    pub fn text(content: impl Into<Bytes>) -> Self {
        Self::new(MediaType::TextPlain, content)
    }

    /// Fully specified document, as rebuilt from a snapshot.
    pub fn from_parts(
        id: DocumentId,
        revision: Revision,
        media_type: MediaType,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            id,
            revision,
            media_type,
            content: content.into(),
        }
    }

    /// Same identity, revision and media type with new content.
    pub fn with_content(&self, content: impl Into<Bytes>) -> Self {
        Self {
            id: self.id,
            revision: self.revision,
            media_type: self.media_type,
            content: content.into(),
        }
    }

    /// Copy of this document carrying the given revision.
    pub fn with_revision(&self, revision: Revision) -> Self {
        Self {
            revision,
            ..self.clone()
        }
    }

    /// Returns `true` if this document has never been stored.
    pub fn is_unstored(&self) -> bool {
        self.revision == UNSTORED_REVISION
    }

    /// Content length in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns `true` if the content is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Lossy UTF-8 view of the content, for display.
    pub fn content_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.revision == other.revision && self.content == other.content
    }
}

impl Eq for Document {}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("revision", &self.revision)
            .field("media_type", &self.media_type)
            .field("content", &self.content_str())
            .finish()
    }
}
