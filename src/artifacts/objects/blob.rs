//! Git blob object
//!
//! Blobs store file content in Git. They contain only the raw file data,
//! without any metadata like filename or permissions (those are stored in trees).

use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::Result;
use bytes::Bytes;

/// Bytes inspected when guessing whether a blob is binary
const BINARY_SNIFF_LEN: usize = 8000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    oid: ObjectId,
    content: Bytes,
}

impl Blob {
    pub fn new(content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Blob {
            oid: ObjectId::hash_object(ObjectType::Blob, &content),
            content,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.oid
    }

    pub fn data(&self) -> &[u8] {
        &self.content
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Same heuristic as git: a NUL byte near the start means binary
    pub fn is_binary(&self) -> bool {
        self.content
            .iter()
            .take(BINARY_SNIFF_LEN)
            .any(|&byte| byte == 0)
    }
}

impl Packable for Blob {
    fn object_type(&self) -> ObjectType {
        ObjectType::Blob
    }

    fn serialize(&self) -> Bytes {
        self.content.clone()
    }

    fn object_id(&self) -> ObjectId {
        self.oid
    }
}

impl Unpackable for Blob {
    fn deserialize(oid: ObjectId, data: Bytes) -> Result<Self> {
        Ok(Blob { oid, content: data })
    }
}
