//! Ketchup: whole-collection snapshot format for PragmaDB.
//!
//! A snapshot is a flat byte stream used for manual, operator-driven export
//! and import. It is never written on a live request path.
//!
//! # Layout
//!
//! ```text
//! <name>;
//! <identity>;<revision>;<content-length>;<raw content bytes>
//! <identity>;<revision>;<content-length>;<raw content bytes>
//! ...
//! ```
//!
//! (Line breaks above are for readability only; entries are concatenated.)
//! Tokens are ASCII text terminated by `;`. Raw content is opaque and is not
//! terminated: the reader consumes exactly `<content-length>` bytes. One entry
//! is written per stored `(identity, revision)` pair. Media types are not
//! recorded.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{KetchupError, KetchupResult};
pub use reader::{decode, decode_from_slice, import_from_path, TokenReader};
pub use writer::{encode, encode_to_vec, export_to_path, SnapshotFile};

/// Token terminator.
pub const DELIMITER: u8 = b';';
