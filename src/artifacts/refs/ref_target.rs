use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::refs::ref_name::RefName;

/// What a reference points at
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RefTarget {
    /// An object, usually a commit
    Direct(ObjectId),
    /// Another reference, followed when resolving
    Symbolic(RefName),
}

impl RefTarget {
    /// `"direct"` or `"symbolic"`
    pub fn kind_name(&self) -> &'static str {
        match self {
            RefTarget::Direct(_) => "direct",
            RefTarget::Symbolic(_) => "symbolic",
        }
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self, RefTarget::Symbolic(_))
    }

    pub fn as_direct(&self) -> Option<ObjectId> {
        match self {
            RefTarget::Direct(oid) => Some(*oid),
            RefTarget::Symbolic(_) => None,
        }
    }

    pub fn as_symbolic(&self) -> Option<&RefName> {
        match self {
            RefTarget::Direct(_) => None,
            RefTarget::Symbolic(name) => Some(name),
        }
    }

    pub(crate) fn same_variant(&self, other: &RefTarget) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl std::fmt::Display for RefTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefTarget::Direct(oid) => write!(f, "{oid}"),
            RefTarget::Symbolic(name) => write!(f, "{name}"),
        }
    }
}

impl From<ObjectId> for RefTarget {
    fn from(oid: ObjectId) -> Self {
        RefTarget::Direct(oid)
    }
}

impl From<RefName> for RefTarget {
    fn from(name: RefName) -> Self {
        RefTarget::Symbolic(name)
    }
}
