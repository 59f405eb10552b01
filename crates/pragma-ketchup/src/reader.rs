use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, info};

use pragma_types::{Collection, Document, DocumentId, MediaType, Revision};

use crate::error::{KetchupError, KetchupResult};
use crate::DELIMITER;

/// Byte cursor over a Ketchup stream.
///
/// Offers the three framing primitives the format needs: read a delimited
/// token, read exactly `n` raw bytes, and check for end of stream. The
/// offset of every error is reported relative to the start of the stream.
pub struct TokenReader<R> {
    inner: R,
    offset: u64,
}

impl<R: BufRead> TokenReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read up to the next delimiter, which is consumed and stripped.
    ///
    /// Returns `None` if the stream ends before any byte is read. A stream
    /// that ends inside a token is malformed.
    pub fn read_token(&mut self) -> KetchupResult<Option<Vec<u8>>> {
        let start = self.offset;
        let mut token = Vec::new();
        let read = self.inner.read_until(DELIMITER, &mut token)?;
        self.offset += read as u64;
        if read == 0 {
            return Ok(None);
        }
        if token.pop() != Some(DELIMITER) {
            return Err(KetchupError::malformed(start, "missing delimiter"));
        }
        Ok(Some(token))
    }

    /// Read exactly `len` raw bytes.
    pub fn read_exact(&mut self, len: u64) -> KetchupResult<Vec<u8>> {
        let start = self.offset;
        let mut content = Vec::new();
        let read = (&mut self.inner).take(len).read_to_end(&mut content)?;
        self.offset += read as u64;
        if (read as u64) < len {
            return Err(KetchupError::malformed(
                start,
                format!("truncated content: expected {len} bytes, got {read}"),
            ));
        }
        Ok(content)
    }

    /// Returns `true` if no bytes remain.
    pub fn is_at_end(&mut self) -> KetchupResult<bool> {
        Ok(self.inner.fill_buf()?.is_empty())
    }

    fn read_text(&mut self, what: &str) -> KetchupResult<Option<String>> {
        let start = self.offset;
        match self.read_token()? {
            None => Ok(None),
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| KetchupError::malformed(start, format!("{what} is not UTF-8"))),
        }
    }

    fn require<T: FromStr>(&mut self, what: &str) -> KetchupResult<T> {
        let start = self.offset;
        let text = self
            .read_text(what)?
            .ok_or_else(|| KetchupError::malformed(start, format!("missing {what}")))?;
        text.parse()
            .map_err(|_| KetchupError::malformed(start, format!("invalid {what}: {text:?}")))
    }
}

/// Read a collection snapshot from `source`.
///
/// Revisions are restored exactly as written and must be exactly `1..=n`
/// for every identity, each written once. The layout carries no media type,
/// so every document comes back as `application/json`. Any framing or
/// revision error aborts the whole decode.
pub fn decode<R: Read>(source: R) -> KetchupResult<Collection> {
    let mut reader = TokenReader::new(BufReader::new(source));
    let name = reader
        .read_text("collection name")?
        .ok_or_else(|| KetchupError::malformed(0, "missing collection name"))?;
    let mut collection = Collection::new(name);
    let mut first_seen: HashMap<DocumentId, u64> = HashMap::new();

    loop {
        let start = reader.offset();
        let Some(token) = reader.read_text("identity")? else {
            break;
        };
        let id = DocumentId::from_str(&token)
            .map_err(|_| KetchupError::malformed(start, format!("invalid identity: {token:?}")))?;

        let revision_at = reader.offset();
        let revision: Revision = reader.require("revision")?;
        if revision == 0 {
            return Err(KetchupError::malformed(revision_at, "revision must be positive"));
        }
        let len: u64 = reader.require("content length")?;
        let content = reader.read_exact(len)?;

        if collection.revision(&id, revision).is_some() {
            return Err(KetchupError::malformed(
                revision_at,
                format!("duplicate revision {revision} for {id}"),
            ));
        }
        first_seen.entry(id).or_insert(start);

        debug!(id = %id, revision, len, "decoded entry");
        collection.put(Document::from_parts(
            id,
            revision,
            MediaType::ApplicationJson,
            content,
        ));
    }

    if let Some((id, missing)) = collection.first_gap() {
        let offset = first_seen.get(&id).copied().unwrap_or_default();
        return Err(KetchupError::malformed(
            offset,
            format!("revisions of {id} are not contiguous: missing {missing}"),
        ));
    }
    Ok(collection)
}

/// Decode a snapshot held in memory.
pub fn decode_from_slice(bytes: &[u8]) -> KetchupResult<Collection> {
    decode(bytes)
}

/// Import a snapshot file.
pub fn import_from_path(path: &Path) -> KetchupResult<Collection> {
    let collection = decode(File::open(path)?)?;
    info!(
        collection = collection.name(),
        path = %path.display(),
        revisions = collection.revision_count(),
        "imported snapshot"
    );
    Ok(collection)
}
