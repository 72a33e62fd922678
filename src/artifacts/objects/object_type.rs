use crate::errors::{Error, Result};

/// Closed set of object kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Commit,
    Tree,
    Blob,
    Tag,
}

/// Kind tags as they appear in object headers
static OBJECT_TYPES: phf::Map<&'static str, ObjectType> = phf::phf_map! {
    "commit" => ObjectType::Commit,
    "tree" => ObjectType::Tree,
    "blob" => ObjectType::Blob,
    "tag" => ObjectType::Tag,
};

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Commit => "commit",
            ObjectType::Tree => "tree",
            ObjectType::Blob => "blob",
            ObjectType::Tag => "tag",
        }
    }
}

impl TryFrom<&str> for ObjectType {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        OBJECT_TYPES
            .get(value)
            .copied()
            .ok_or_else(|| Error::UnknownKind(value.to_string()))
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind constraint for object lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    Any,
    Only(ObjectType),
}

impl KindFilter {
    pub fn accepts(&self, object_type: ObjectType) -> bool {
        match self {
            KindFilter::Any => true,
            KindFilter::Only(expected) => *expected == object_type,
        }
    }
}

impl From<ObjectType> for KindFilter {
    fn from(object_type: ObjectType) -> Self {
        KindFilter::Only(object_type)
    }
}
