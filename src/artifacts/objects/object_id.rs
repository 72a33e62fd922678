//! Object identifiers (SHA-1 hashes)
//!
//! Object IDs are 20-byte SHA-1 digests, written as 40 lowercase hexadecimal
//! characters. They uniquely identify every object (blob, tree, commit, tag).
//!
//! ## Forms
//!
//! - Full: [`ObjectId`], exactly [`ID_SIZE`] raw bytes
//! - Short: [`ShortId`], 1 to [`HEX_SIZE`] hex characters that still have to be
//!   expanded against an object store before they can be used as a key
//!
//! ## Storage
//!
//! Loose objects are stored in `<objects>/<first-2-chars>/<remaining-38-chars>`

use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::{HEX_SIZE, ID_SIZE, SHORT_ID_LENGTH};
use crate::errors::{Error, Result};
use sha1::{Digest, Sha1};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Full object identifier
///
/// Equality and ordering are those of the raw bytes, so sorting a list of
/// IDs sorts it lexicographically by hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectId([u8; ID_SIZE]);

impl ObjectId {
    /// Build an object ID from raw bytes
    ///
    /// # Errors
    ///
    /// `InvalidLength` unless `raw` is exactly [`ID_SIZE`] bytes long
    pub fn from_raw(raw: &[u8]) -> Result<Self> {
        let bytes: [u8; ID_SIZE] = raw
            .try_into()
            .map_err(|_| Error::InvalidLength(raw.len()))?;
        Ok(Self(bytes))
    }

    /// Parse a full-length hexadecimal object ID
    ///
    /// Upper-case digits are accepted; the rendered form is always lower-case.
    pub fn try_parse(hex: &str) -> Result<Self> {
        if hex.len() != HEX_SIZE {
            return Err(Error::InvalidLength(hex.len()));
        }

        let mut bytes = [0u8; ID_SIZE];
        hex::decode_to_slice(hex, &mut bytes).map_err(|_| Error::InvalidHex(hex.to_string()))?;
        Ok(Self(bytes))
    }

    /// Hash an object payload the way git does: `"<kind> <len>\0" + payload`
    pub fn hash_object(object_type: ObjectType, data: &[u8]) -> Self {
        let header = format!("{} {}\0", object_type.as_str(), data.len());
        let mut hasher = Sha1::new();
        hasher.update(header.as_bytes());
        hasher.update(data);

        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }

    /// Lowercase, zero-padded, [`HEX_SIZE`] characters
    pub fn hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated form of the object ID (first 7 hex characters)
    pub fn short(&self) -> String {
        self.abbrev(SHORT_ID_LENGTH)
    }

    /// The first `len` hex characters, capped at [`HEX_SIZE`]
    pub fn abbrev(&self, len: usize) -> String {
        let mut hex = self.hex();
        hex.truncate(len.min(HEX_SIZE));
        hex
    }

    /// Whether the hex form of this ID starts with `prefix`
    pub fn starts_with(&self, prefix: &ShortId) -> bool {
        prefix.matches(self)
    }

    /// Convert to file system path for loose object storage
    ///
    /// Splits the hash as `XX/YYYYYY...` where XX is the first 2 chars.
    pub fn to_path(&self) -> PathBuf {
        let hex = self.hex();
        let (dir, file) = hex.split_at(2);
        PathBuf::from(dir).join(file)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_parse(s)
    }
}

/// Partial object identifier
///
/// Holds the leading `len` nibbles of an ID. An odd-length prefix keeps its
/// last nibble in the high half of the final byte and only that half takes
/// part in matching.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShortId {
    bytes: [u8; ID_SIZE],
    len: usize,
}

impl ShortId {
    /// Parse 1 to [`HEX_SIZE`] hex characters
    pub fn from_hex(text: &str) -> Result<Self> {
        if text.is_empty() || text.len() > HEX_SIZE {
            return Err(Error::InvalidLength(text.len()));
        }

        let mut bytes = [0u8; ID_SIZE];
        for (index, digit) in text.bytes().enumerate() {
            let nibble = (digit as char)
                .to_digit(16)
                .ok_or_else(|| Error::InvalidHex(text.to_string()))? as u8;
            if index % 2 == 0 {
                bytes[index / 2] = nibble << 4;
            } else {
                bytes[index / 2] |= nibble;
            }
        }

        Ok(Self {
            bytes,
            len: text.len(),
        })
    }

    /// Number of hex characters in the prefix
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == HEX_SIZE
    }

    /// The full object ID when the prefix covers every nibble
    pub fn as_full(&self) -> Option<ObjectId> {
        self.is_full().then_some(ObjectId(self.bytes))
    }

    /// Lowercase hex text of the prefix
    pub fn hex(&self) -> String {
        let mut hex = hex::encode(self.bytes);
        hex.truncate(self.len);
        hex
    }

    pub fn matches(&self, oid: &ObjectId) -> bool {
        let full_bytes = self.len / 2;
        if self.bytes[..full_bytes] != oid.0[..full_bytes] {
            return false;
        }

        if self.len % 2 == 1 {
            return self.bytes[full_bytes] >> 4 == oid.0[full_bytes] >> 4;
        }

        true
    }

    /// Smallest and largest IDs that start with this prefix, both inclusive
    pub fn bounds(&self) -> (ObjectId, ObjectId) {
        let lower = self.bytes;
        let mut upper = self.bytes;

        let full_bytes = self.len / 2;
        if self.len % 2 == 1 {
            upper[full_bytes] |= 0x0f;
            upper[full_bytes + 1..].fill(0xff);
        } else {
            upper[full_bytes..].fill(0xff);
        }

        (ObjectId(lower), ObjectId(upper))
    }
}

impl fmt::Debug for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShortId({})", self.hex())
    }
}

impl fmt::Display for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}

impl From<ObjectId> for ShortId {
    fn from(oid: ObjectId) -> Self {
        Self {
            bytes: oid.0,
            len: HEX_SIZE,
        }
    }
}
