//! Foundation types for PragmaDB.
//!
//! This crate holds the pure data model shared by every other PragmaDB crate.
//! Nothing in here is synchronized: a [`Collection`] is only ever mutated by
//! the storage engine that owns it.
//!
//! # Key Types
//!
//! - [`DocumentId`]: Opaque identity shared by all revisions of a document
//! - [`MediaType`]: Closed set of supported content types
//! - [`Document`]: One immutable revision of a document
//! - [`Collection`]: Named map of identity to revision history

pub mod collection;
pub mod document;
pub mod error;
pub mod media;

pub use collection::{Collection, MAX_NAME_LEN};
pub use document::{Document, DocumentId, Revision, UNSTORED_REVISION};
pub use error::TypeError;
pub use media::MediaType;
