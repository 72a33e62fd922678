//! Object database
//!
//! [`Database`] is the only way the rest of the crate reaches stored objects.
//! It sits on top of an [`ObjectStore`], the narrow capability a backend has
//! to provide (read by full ID, list IDs by prefix, write a payload), and adds
//! prefix expansion, kind filtering and decoding into [`Object`].

use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::{ObjectId, ShortId};
use crate::artifacts::objects::object_type::{KindFilter, ObjectType};
use crate::artifacts::objects::{HEX_SIZE, MIN_PREFIX_LEN};
use crate::errors::{Error, Result};
use bytes::Bytes;
use std::fmt::Debug;
use std::sync::Arc;

/// An object as it comes out of a backend, before decoding
///
/// `kind` is the tag found in the object header, kept as text so that an
/// unknown tag can be reported instead of silently dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObject {
    pub kind: String,
    pub data: Bytes,
}

/// Storage capability behind a [`Database`]
pub trait ObjectStore: Debug + Send + Sync {
    /// Read the object stored under `oid`, `None` when it does not exist
    fn read(&self, oid: &ObjectId) -> Result<Option<RawObject>>;

    /// Every stored ID starting with `prefix`
    fn find_by_prefix(&self, prefix: &ShortId) -> Result<Vec<ObjectId>>;

    /// Store a payload and return its ID; storing the same payload twice is a no-op
    fn write(&self, object_type: ObjectType, data: Bytes) -> Result<ObjectId>;

    fn contains(&self, oid: &ObjectId) -> Result<bool> {
        Ok(self.read(oid)?.is_some())
    }
}

#[derive(Debug, Clone)]
pub struct Database {
    store: Arc<dyn ObjectStore>,
}

impl Database {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Database { store }
    }

    /// Load and decode the object stored under `oid`
    ///
    /// # Errors
    ///
    /// - `ObjectNotFound` when nothing is stored under `oid`
    /// - `TypeMismatch` when `filter` rejects the stored kind
    /// - `UnknownKind` / `Corrupt` when the stored data cannot be decoded
    pub fn lookup(&self, oid: &ObjectId, filter: KindFilter) -> Result<Object> {
        let raw = self.store.read(oid)?.ok_or(Error::ObjectNotFound(*oid))?;
        let object_type = ObjectType::try_from(raw.kind.as_str())?;

        if let KindFilter::Only(expected) = filter
            && expected != object_type
        {
            return Err(Error::TypeMismatch {
                oid: *oid,
                expected,
                actual: object_type,
            });
        }

        tracing::trace!(%oid, kind = %object_type, size = raw.data.len(), "loaded object");
        Object::decode(*oid, object_type, raw.data)
    }

    /// Expand `prefix` and load the object it names
    pub fn lookup_prefix(&self, prefix: &str, filter: KindFilter) -> Result<Object> {
        let oid = self.expand(prefix)?;
        self.lookup(&oid, filter)
    }

    pub fn lookup_commit(&self, oid: &ObjectId) -> Result<Commit> {
        self.lookup(oid, KindFilter::Only(ObjectType::Commit))?
            .into_commit()
    }

    /// Turn a hex prefix into the single stored ID it abbreviates
    ///
    /// A full-length ID is returned as is, without asking the store whether
    /// it exists.
    ///
    /// # Errors
    ///
    /// - `InvalidLength` for prefixes shorter than [`MIN_PREFIX_LEN`] or longer than [`HEX_SIZE`]
    /// - `InvalidHex` for non-hex characters
    /// - `PrefixNotFound` when no stored ID matches
    /// - `Ambiguous` when more than one does
    pub fn expand(&self, prefix: &str) -> Result<ObjectId> {
        if prefix.len() == HEX_SIZE {
            return ObjectId::try_parse(prefix);
        }
        if prefix.len() < MIN_PREFIX_LEN || prefix.len() > HEX_SIZE {
            return Err(Error::InvalidLength(prefix.len()));
        }

        let short_id = ShortId::from_hex(prefix)?;
        let mut candidates = self.store.find_by_prefix(&short_id)?;
        candidates.sort();
        candidates.dedup();

        match candidates.as_slice() {
            [] => Err(Error::PrefixNotFound(short_id.hex())),
            [oid] => Ok(*oid),
            _ => {
                tracing::debug!(
                    prefix = %short_id,
                    candidates = ?candidates.iter().map(ObjectId::short).collect::<Vec<_>>(),
                    "ambiguous object prefix"
                );
                Err(Error::Ambiguous {
                    prefix: short_id.hex(),
                    candidates: candidates.len(),
                })
            }
        }
    }

    pub fn contains(&self, oid: &ObjectId) -> Result<bool> {
        self.store.contains(oid)
    }

    /// Kind of the object stored under `oid`, without decoding its payload
    pub fn read_header(&self, oid: &ObjectId) -> Result<ObjectType> {
        let raw = self.store.read(oid)?.ok_or(Error::ObjectNotFound(*oid))?;
        ObjectType::try_from(raw.kind.as_str())
    }

    /// Store an object and return its ID
    pub fn write(&self, object: &impl Packable) -> Result<ObjectId> {
        let oid = self.store.write(object.object_type(), object.serialize())?;
        tracing::debug!(%oid, kind = %object.object_type(), "stored object");

        Ok(oid)
    }
}
