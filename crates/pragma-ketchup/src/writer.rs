use std::fs::OpenOptions;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use pragma_types::{Collection, Document};

use crate::error::{KetchupError, KetchupResult};
use crate::DELIMITER;

/// Result of exporting a snapshot to disk.
#[derive(Clone, Debug)]
pub struct SnapshotFile {
    pub path: PathBuf,
    pub revision_count: usize,
    pub byte_len: u64,
}

/// Write `collection` to `sink` in Ketchup layout.
///
/// Returns the number of bytes written.
pub fn encode<W: Write>(collection: &Collection, sink: &mut W) -> KetchupResult<u64> {
    let name = collection.name();
    if name.as_bytes().contains(&DELIMITER) {
        return Err(KetchupError::UnencodableName(name.to_string()));
    }

    let mut written = 0u64;
    written += write_token(sink, name.as_bytes())?;
    for document in collection.iter() {
        written += write_entry(sink, document)?;
    }
    Ok(written)
}

/// Encode `collection` into a fresh buffer.
pub fn encode_to_vec(collection: &Collection) -> KetchupResult<Vec<u8>> {
    let mut buf = Vec::new();
    encode(collection, &mut buf)?;
    Ok(buf)
}

/// Export `collection` to a new file at `path`.
///
/// Never overwrites: fails with [`KetchupError::AlreadyExists`] if the file
/// is already there.
pub fn export_to_path(collection: &Collection, path: &Path) -> KetchupResult<SnapshotFile> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => KetchupError::AlreadyExists(path.to_path_buf()),
            _ => KetchupError::Io(e),
        })?;
    let mut sink = BufWriter::new(file);
    let byte_len = encode(collection, &mut sink)?;
    sink.flush()?;

    info!(
        collection = collection.name(),
        path = %path.display(),
        revisions = collection.revision_count(),
        bytes = byte_len,
        "exported snapshot"
    );
    Ok(SnapshotFile {
        path: path.to_path_buf(),
        revision_count: collection.revision_count(),
        byte_len,
    })
}

fn write_entry<W: Write>(sink: &mut W, document: &Document) -> KetchupResult<u64> {
    let mut written = 0u64;
    written += write_token(sink, document.id.to_string().as_bytes())?;
    written += write_token(sink, document.revision.to_string().as_bytes())?;
    written += write_token(sink, document.content.len().to_string().as_bytes())?;
    // Raw content is not terminated; the reader relies on the length token.
    sink.write_all(&document.content)?;
    written += document.content.len() as u64;
    Ok(written)
}

fn write_token<W: Write>(sink: &mut W, token: &[u8]) -> KetchupResult<u64> {
    sink.write_all(token)?;
    sink.write_all(&[DELIMITER])?;
    Ok(token.len() as u64 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pragma_types::{DocumentId, MediaType};

    #[test]
    fn empty_collection_is_just_the_name() {
        let bytes = encode_to_vec(&Collection::new("empty")).unwrap();
        assert_eq!(bytes, b"empty;");
    }

    #[test]
    fn single_entry_layout() {
        let id = DocumentId::new();
        let mut collection = Collection::new("c");
        collection.put(Document::from_parts(id, 1, MediaType::TextPlain, "foo"));

        let bytes = encode_to_vec(&collection).unwrap();
        let expected = format!("c;{id};1;3;foo");
        assert_eq!(bytes, expected.as_bytes());
    }

    #[test]
    fn entries_are_not_separated() {
        let id = DocumentId::new();
        let mut collection = Collection::new("c");
        collection.put(Document::from_parts(id, 1, MediaType::TextPlain, "ab"));
        collection.put(Document::from_parts(id, 2, MediaType::TextPlain, "cd"));

        let bytes = encode_to_vec(&collection).unwrap();
        let expected = format!("c;{id};1;2;ab{id};2;2;cd");
        assert_eq!(bytes, expected.as_bytes());
    }

    #[test]
    fn content_may_contain_delimiter() {
        let id = DocumentId::new();
        let mut collection = Collection::new("c");
        collection.put(Document::from_parts(id, 1, MediaType::TextPlain, "a;b"));
        let bytes = encode_to_vec(&collection).unwrap();
        assert!(bytes.ends_with(b";3;a;b"));
    }

    #[test]
    fn reports_bytes_written() {
        let mut collection = Collection::new("c");
        collection.save(Document::text("foo"));
        let mut buf = Vec::new();
        let written = encode(&collection, &mut buf).unwrap();
        assert_eq!(written, buf.len() as u64);
    }

    #[test]
    fn name_with_delimiter_is_rejected() {
        let err = encode_to_vec(&Collection::new("a;b")).unwrap_err();
        assert!(matches!(err, KetchupError::UnencodableName(name) if name == "a;b"));
    }

    #[test]
    fn export_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ketchup.bin");
        let collection = Collection::new("c");

        let file = export_to_path(&collection, &path).unwrap();
        assert_eq!(file.byte_len, 2);
        assert!(path.exists());

        let err = export_to_path(&collection, &path).unwrap_err();
        assert!(matches!(err, KetchupError::AlreadyExists(p) if p == path));
    }
}
