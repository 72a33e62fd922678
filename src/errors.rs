//! Error types for object, reference and revision-walk operations
//!
//! Every fallible operation in the crate returns [`Result`]. Running out of
//! commits during a revision walk is not an error, see
//! [`WalkStep`](crate::artifacts::log::rev_walk::WalkStep).

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No object is stored under the identifier
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// No stored object starts with the prefix
    #[error("no object matches prefix {0}")]
    PrefixNotFound(String),

    /// No reference with the name exists
    #[error("reference not found: {0}")]
    ReferenceNotFound(String),

    /// A revision expression names nothing, such as the parent of a root commit
    #[error("unknown revision: {0}")]
    UnknownRevision(String),

    /// No tree entry exists at the path
    #[error("path not found in tree: {0}")]
    PathNotFound(String),

    /// The prefix matches more than one stored object
    #[error("short object id {prefix} is ambiguous ({candidates} candidates)")]
    Ambiguous { prefix: String, candidates: usize },

    #[error("invalid object id length: {0}")]
    InvalidLength(usize),

    #[error("invalid hex in object id: {0}")]
    InvalidHex(String),

    /// The stored kind differs from the requested one
    #[error("object {oid} is a {actual}, not a {expected}")]
    TypeMismatch {
        oid: ObjectId,
        expected: ObjectType,
        actual: ObjectType,
    },

    /// The store returned a kind tag outside the closed set
    #[error("unknown object kind: {0}")]
    UnknownKind(String),

    #[error("cannot peel {kind} {oid} to a {target}")]
    CannotPeel {
        oid: ObjectId,
        kind: ObjectType,
        target: ObjectType,
    },

    #[error("reference already exists: {0}")]
    AlreadyExists(String),

    /// A symbolic chain loops back on itself or nests too deeply
    #[error("symbolic reference cycle while resolving {0}")]
    ResolutionCycle(String),

    /// The reference handle was deleted
    #[error("reference handle has been deleted")]
    InvalidatedReference,

    #[error("invalid reference name: {0}")]
    InvalidReferenceName(String),

    /// A direct target was given to a symbolic reference or the other way round
    #[error("reference {name} is {actual}, cannot take a {given} target")]
    ReferenceTypeMismatch {
        name: String,
        actual: &'static str,
        given: &'static str,
    },

    /// Stored data could not be decoded
    #[error("corrupt object {oid}: {reason}")]
    Corrupt { oid: String, reason: String },

    /// Name or email would break the `Name <email> time offset` line
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// An identity environment variable is unset
    #[error("{0} not set")]
    MissingIdentity(&'static str),

    #[error("unsupported message encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("message is not valid {0}")]
    InvalidEncoding(String),

    /// `push` or `hide` on a walk that already returned its end
    #[error("revision walk has ended, reset it before adding commits")]
    WalkEnded,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl Error {
    /// Whether the error means an object, prefix or reference does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ObjectNotFound(_)
                | Error::PrefixNotFound(_)
                | Error::ReferenceNotFound(_)
                | Error::PathNotFound(_)
                | Error::UnknownRevision(_)
        )
    }

    /// Whether the error comes from a name clash during create or rename
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::AlreadyExists(_))
    }

    pub(crate) fn corrupt(oid: impl ToString, reason: impl Into<String>) -> Self {
        Error::Corrupt {
            oid: oid.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
