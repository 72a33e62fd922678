//! Git commit object
//!
//! Commits represent snapshots of the repository at specific points in time.
//! They contain:
//! - A tree object ID (directory snapshot)
//! - Parent commit ID(s) (for history)
//! - Author and committer information
//! - An optional message encoding
//! - Commit message
//!
//! ## Format
//!
//! Payload:
//! ```text
//! tree <tree-sha>
//! parent <parent-sha>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//! encoding <label>
//!
//! <commit message>
//! ```
//!
//! Headers git adds for other purposes (`gpgsig`, `mergetag`, ...) and their
//! continuation lines are kept in the payload but not interpreted.

use crate::areas::database::Database;
use crate::artifacts::objects::encoding::TextEncoding;
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::{KindFilter, ObjectType};
use crate::artifacts::objects::signature::Signature;
use crate::artifacts::objects::tree::Tree;
use crate::errors::{Error, Result};
use bytes::Bytes;
use std::borrow::Cow;

/// Git commit object
///
/// The decoded header fields live next to the payload they came from, so
/// re-serializing a stored commit reproduces its ID exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    oid: ObjectId,
    data: Bytes,
    /// Tree object ID representing the directory snapshot
    tree_oid: ObjectId,
    /// Parent commit IDs (empty for a root commit, several for a merge)
    parents: Vec<ObjectId>,
    author: Signature,
    committer: Signature,
    encoding: Option<String>,
    /// Offset of the message inside `data`
    message_start: usize,
}

impl Commit {
    /// Create a new commit
    ///
    /// # Arguments
    ///
    /// * `tree_oid` - Tree object representing the snapshot
    /// * `parents` - Parent commit IDs, first parent first
    /// * `author` - Who wrote the changes
    /// * `committer` - Who recorded the commit
    /// * `message` - Commit message
    /// * `encoding` - Label written to the `encoding` header; UTF-8 when `None`
    pub fn new(
        tree_oid: ObjectId,
        parents: Vec<ObjectId>,
        author: Signature,
        committer: Signature,
        message: &str,
        encoding: Option<&str>,
    ) -> Result<Self> {
        let text_encoding = TextEncoding::for_header(encoding)?;

        let mut headers = vec![format!("tree {tree_oid}")];
        headers.extend(parents.iter().map(|parent| format!("parent {parent}")));
        headers.push(format!("author {author}"));
        headers.push(format!("committer {committer}"));
        if let Some(label) = encoding {
            headers.push(format!("encoding {label}"));
        }

        let mut payload = headers.join("\n").into_bytes();
        payload.extend_from_slice(b"\n\n");
        payload.extend_from_slice(&text_encoding.encode(message)?);

        let data = Bytes::from(payload);
        Self::deserialize(ObjectId::hash_object(ObjectType::Commit, &data), data)
    }

    pub fn id(&self) -> ObjectId {
        self.oid
    }

    /// Get the tree object ID
    pub fn tree_id(&self) -> ObjectId {
        self.tree_oid
    }

    /// Load the tree this commit snapshots
    pub fn tree(&self, database: &Database) -> Result<Tree> {
        database
            .lookup(&self.tree_oid, KindFilter::Only(ObjectType::Tree))?
            .into_tree()
    }

    pub fn parent_ids(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn parent_id(&self, index: usize) -> Option<ObjectId> {
        self.parents.get(index).copied()
    }

    pub fn parent_count(&self) -> usize {
        self.parents.len()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// Load every parent commit
    ///
    /// Either all parents are returned or the first lookup error is.
    pub fn parents(&self, database: &Database) -> Result<Vec<Commit>> {
        self.parents
            .iter()
            .map(|parent| database.lookup_commit(parent))
            .collect()
    }

    pub fn author(&self) -> &Signature {
        &self.author
    }

    pub fn committer(&self) -> &Signature {
        &self.committer
    }

    /// Committer time, seconds since the Unix epoch
    pub fn commit_time(&self) -> i64 {
        self.committer.time()
    }

    /// Committer timezone offset in minutes
    pub fn commit_time_offset(&self) -> i32 {
        self.committer.offset()
    }

    /// Label of the `encoding` header, if present
    pub fn message_encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// The message exactly as stored
    pub fn raw_message(&self) -> &[u8] {
        &self.data[self.message_start..]
    }

    /// The message decoded with its declared encoding, UTF-8 by default
    pub fn message(&self) -> Result<Cow<'_, str>> {
        TextEncoding::for_header(self.message_encoding())?.decode(self.raw_message())
    }

    /// Get the first line of the commit message
    ///
    /// Useful for short-form display (e.g., `git log --oneline`)
    pub fn summary(&self) -> Result<String> {
        Ok(self
            .message()?
            .lines()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("")
            .trim()
            .to_string())
    }

    /// Header lines of the payload with continuation lines folded into their header
    fn header_fields(oid: ObjectId, headers: &[u8]) -> Vec<(&[u8], Vec<u8>)> {
        let mut fields: Vec<(&[u8], Vec<u8>)> = Vec::new();

        for line in headers.split(|&b| b == b'\n') {
            if let Some(continuation) = line.strip_prefix(b" ") {
                if let Some((_, value)) = fields.last_mut() {
                    value.push(b'\n');
                    value.extend_from_slice(continuation);
                }
                continue;
            }

            let (key, value) = match line.iter().position(|&b| b == b' ') {
                Some(space) => (&line[..space], line[space + 1..].to_vec()),
                None => (line, Vec::new()),
            };
            fields.push((key, value));
        }

        tracing::trace!(%oid, headers = fields.len(), "parsed commit headers");
        fields
    }
}

fn parse_oid_field(oid: ObjectId, field: &str, value: &[u8]) -> Result<ObjectId> {
    std::str::from_utf8(value)
        .ok()
        .and_then(|text| ObjectId::try_parse(text).ok())
        .ok_or_else(|| Error::corrupt(oid, format!("invalid {field} line")))
}

fn parse_signature_field(
    oid: ObjectId,
    field: &str,
    value: &[u8],
    encoding: TextEncoding,
) -> Result<Signature> {
    let text = encoding
        .decode(value)
        .unwrap_or_else(|_| String::from_utf8_lossy(value));
    Signature::parse(&text).map_err(|_| Error::corrupt(oid, format!("invalid {field} line")))
}

impl Packable for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn serialize(&self) -> Bytes {
        self.data.clone()
    }

    fn object_id(&self) -> ObjectId {
        self.oid
    }
}

impl Unpackable for Commit {
    fn deserialize(oid: ObjectId, data: Bytes) -> Result<Self> {
        let (headers, message_start) = match data.windows(2).position(|w| w == b"\n\n") {
            Some(split) => (&data[..split], split + 2),
            None => (&data[..], data.len()),
        };

        let fields = Self::header_fields(oid, headers);

        let encoding = fields
            .iter()
            .find(|(key, _)| *key == b"encoding")
            .map(|(_, value)| String::from_utf8_lossy(value).trim().to_string());
        // signatures fall back to lossy UTF-8 when the label is unknown
        let text_encoding = TextEncoding::for_header(encoding.as_deref()).unwrap_or_default();

        let mut tree_oid = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;

        for (key, value) in &fields {
            match *key {
                b"tree" if tree_oid.is_none() => {
                    tree_oid = Some(parse_oid_field(oid, "tree", value)?)
                }
                b"parent" => parents.push(parse_oid_field(oid, "parent", value)?),
                b"author" if author.is_none() => {
                    author = Some(parse_signature_field(oid, "author", value, text_encoding)?)
                }
                b"committer" if committer.is_none() => {
                    committer = Some(parse_signature_field(
                        oid,
                        "committer",
                        value,
                        text_encoding,
                    )?)
                }
                _ => {}
            }
        }

        let tree_oid = tree_oid.ok_or_else(|| Error::corrupt(oid, "missing tree line"))?;
        let author = author.ok_or_else(|| Error::corrupt(oid, "missing author line"))?;
        let committer = committer.ok_or_else(|| Error::corrupt(oid, "missing committer line"))?;

        Ok(Commit {
            oid,
            tree_oid,
            parents,
            author,
            committer,
            encoding,
            message_start,
            data,
        })
    }
}
