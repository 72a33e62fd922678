use crate::areas::database::{ObjectStore, RawObject};
use crate::areas::refs::RefBackend;
use crate::artifacts::objects::object_id::{ObjectId, ShortId};
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::refs::ref_name::RefName;
use crate::artifacts::refs::ref_target::RefTarget;
use crate::errors::Result;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Objects kept in memory, ordered by ID so prefix lookups are range scans
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<ObjectId, RawObject>>,
}

impl MemoryObjectStore {
    /// Store `data` under `oid` as is, without hashing or checking the kind tag
    pub fn insert_raw(&self, oid: ObjectId, kind: &str, data: impl Into<Bytes>) {
        self.objects.write().insert(
            oid,
            RawObject {
                kind: kind.to_string(),
                data: data.into(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn read(&self, oid: &ObjectId) -> Result<Option<RawObject>> {
        Ok(self.objects.read().get(oid).cloned())
    }

    fn find_by_prefix(&self, prefix: &ShortId) -> Result<Vec<ObjectId>> {
        let (lower, upper) = prefix.bounds();
        Ok(self
            .objects
            .read()
            .range(lower..=upper)
            .map(|(oid, _)| *oid)
            .collect())
    }

    fn write(&self, object_type: ObjectType, data: Bytes) -> Result<ObjectId> {
        let oid = ObjectId::hash_object(object_type, &data);
        self.objects
            .write()
            .entry(oid)
            .or_insert_with(|| RawObject {
                kind: object_type.as_str().to_string(),
                data,
            });

        Ok(oid)
    }

    fn contains(&self, oid: &ObjectId) -> Result<bool> {
        Ok(self.objects.read().contains_key(oid))
    }
}

/// References kept in memory
#[derive(Debug, Default)]
pub struct MemoryRefBackend {
    refs: RwLock<BTreeMap<RefName, RefTarget>>,
}

impl RefBackend for MemoryRefBackend {
    fn read(&self, name: &RefName) -> Result<Option<RefTarget>> {
        Ok(self.refs.read().get(name).cloned())
    }

    fn write(&self, name: &RefName, target: &RefTarget) -> Result<()> {
        self.refs.write().insert(name.clone(), target.clone());
        Ok(())
    }

    fn remove(&self, name: &RefName) -> Result<bool> {
        Ok(self.refs.write().remove(name).is_some())
    }

    fn names(&self) -> Result<Vec<RefName>> {
        Ok(self.refs.read().keys().cloned().collect())
    }
}
