use crate::areas::database::Database;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::{KindFilter, ObjectType};
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use crate::errors::{Error, Result};
use bytes::Bytes;

/// Encoding of an object to its payload (the bytes after the `<type> <size>\0` header)
pub trait Packable {
    fn object_type(&self) -> ObjectType;

    fn serialize(&self) -> Bytes;

    fn object_id(&self) -> ObjectId {
        ObjectId::hash_object(self.object_type(), &self.serialize())
    }
}

/// Decoding of a payload read back from a store under `oid`
pub trait Unpackable {
    fn deserialize(oid: ObjectId, data: Bytes) -> Result<Self>
    where
        Self: Sized;
}

/// A decoded object of any kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Commit(Commit),
    Tree(Tree),
    Blob(Blob),
    Tag(Tag),
}

impl Object {
    /// Decode a payload according to the kind tag found in its header
    pub fn wrap(oid: ObjectId, kind_tag: &str, data: Bytes) -> Result<Object> {
        Self::decode(oid, ObjectType::try_from(kind_tag)?, data)
    }

    pub fn decode(oid: ObjectId, object_type: ObjectType, data: Bytes) -> Result<Object> {
        Ok(match object_type {
            ObjectType::Commit => Object::Commit(Commit::deserialize(oid, data)?),
            ObjectType::Tree => Object::Tree(Tree::deserialize(oid, data)?),
            ObjectType::Blob => Object::Blob(Blob::deserialize(oid, data)?),
            ObjectType::Tag => Object::Tag(Tag::deserialize(oid, data)?),
        })
    }

    pub fn id(&self) -> ObjectId {
        match self {
            Object::Commit(commit) => commit.id(),
            Object::Tree(tree) => tree.id(),
            Object::Blob(blob) => blob.id(),
            Object::Tag(tag) => tag.id(),
        }
    }

    pub fn kind(&self) -> ObjectType {
        match self {
            Object::Commit(_) => ObjectType::Commit,
            Object::Tree(_) => ObjectType::Tree,
            Object::Blob(_) => ObjectType::Blob,
            Object::Tag(_) => ObjectType::Tag,
        }
    }

    /// Follow tag targets and commit trees until an object of `target` kind is reached
    ///
    /// # Errors
    ///
    /// `CannotPeel` when the chain stops at an object that has no further
    /// indirection (a blob, a tree, or a commit asked to become a tag).
    pub fn peel(self, database: &Database, target: ObjectType) -> Result<Object> {
        let mut current = self;

        loop {
            if current.kind() == target {
                return Ok(current);
            }

            current = match &current {
                Object::Tag(tag) => database.lookup(&tag.target_id(), KindFilter::Any)?,
                Object::Commit(commit) => {
                    database.lookup(&commit.tree_id(), KindFilter::Only(ObjectType::Tree))?
                }
                Object::Tree(_) | Object::Blob(_) => {
                    return Err(Error::CannotPeel {
                        oid: current.id(),
                        kind: current.kind(),
                        target,
                    });
                }
            };
        }
    }

    pub fn into_commit(self) -> Result<Commit> {
        match self {
            Object::Commit(commit) => Ok(commit),
            other => Err(other.mismatch(ObjectType::Commit)),
        }
    }

    pub fn into_tree(self) -> Result<Tree> {
        match self {
            Object::Tree(tree) => Ok(tree),
            other => Err(other.mismatch(ObjectType::Tree)),
        }
    }

    pub fn into_blob(self) -> Result<Blob> {
        match self {
            Object::Blob(blob) => Ok(blob),
            other => Err(other.mismatch(ObjectType::Blob)),
        }
    }

    pub fn into_tag(self) -> Result<Tag> {
        match self {
            Object::Tag(tag) => Ok(tag),
            other => Err(other.mismatch(ObjectType::Tag)),
        }
    }

    pub fn as_commit(&self) -> Option<&Commit> {
        match self {
            Object::Commit(commit) => Some(commit),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            Object::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&Blob> {
        match self {
            Object::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Object::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    fn mismatch(&self, expected: ObjectType) -> Error {
        Error::TypeMismatch {
            oid: self.id(),
            expected,
            actual: self.kind(),
        }
    }
}

impl Packable for Object {
    fn object_type(&self) -> ObjectType {
        self.kind()
    }

    fn serialize(&self) -> Bytes {
        match self {
            Object::Commit(commit) => commit.serialize(),
            Object::Tree(tree) => tree.serialize(),
            Object::Blob(blob) => blob.serialize(),
            Object::Tag(tag) => tag.serialize(),
        }
    }

    fn object_id(&self) -> ObjectId {
        self.id()
    }
}

macro_rules! impl_into_object {
    ($($kind:ident),*) => {
        $(
            impl From<$kind> for Object {
                fn from(value: $kind) -> Self {
                    Object::$kind(value)
                }
            }
        )*
    };
}

impl_into_object!(Commit, Tree, Blob, Tag);
