use crate::areas::refs::{Refs, looks_like_object_id};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::{KindFilter, ObjectType};
use crate::artifacts::refs::{ANCESTOR_REGEX, PARENT_REGEX, compiled};
use crate::errors::{Error, Result};

/// A revision expression naming one object
///
/// Supported forms:
/// - Reference names, full or short: `refs/heads/main`, `main`, `v1.0`, `HEAD`
/// - Aliases: `@` (resolves to `HEAD`)
/// - Object IDs, full or abbreviated to at least 4 hex characters
/// - Parent notation: `<revision>^`
/// - Ancestor notation: `<revision>~<n>`, following first parents
///
/// References win over object IDs when a name could be both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    /// A reference name or object ID, told apart during resolution
    Name(String),
    /// The first parent of a revision (e.g., HEAD^)
    Parent(Box<Revision>),
    /// The Nth first-parent ancestor of a revision (e.g., HEAD~3)
    Ancestor(Box<Revision>, usize),
}

impl Revision {
    pub fn try_parse(revision: &str) -> Result<Revision> {
        if revision.is_empty() {
            return Err(Error::UnknownRevision(revision.to_string()));
        }

        if let Some(caps) = compiled(&PARENT_REGEX)?.captures(revision) {
            let base_revision = Self::try_parse(&caps[1])?;
            return Ok(Revision::Parent(Box::new(base_revision)));
        }

        if let Some(caps) = compiled(&ANCESTOR_REGEX)?.captures(revision) {
            let generations: usize = caps[2]
                .parse()
                .map_err(|_| Error::UnknownRevision(revision.to_string()))?;
            let base_revision = Self::try_parse(&caps[1])?;
            return Ok(Revision::Ancestor(Box::new(base_revision), generations));
        }

        Ok(Revision::Name(revision.to_string()))
    }

    /// Object ID the expression names
    ///
    /// Plain names resolve to whatever their reference or ID points at, which
    /// may be a tag. Parent and ancestor steps peel to commits first.
    pub fn resolve(&self, refs: &Refs) -> Result<ObjectId> {
        match self {
            Revision::Name(name) => Self::resolve_name(name, refs),
            Revision::Parent(base_revision) => Self::first_parent(base_revision.resolve(refs)?, refs),
            Revision::Ancestor(base_revision, generations) => {
                let mut oid = base_revision.resolve(refs)?;
                for _ in 0..*generations {
                    oid = Self::first_parent(oid, refs)?;
                }

                Ok(oid)
            }
        }
    }

    fn resolve_name(name: &str, refs: &Refs) -> Result<ObjectId> {
        match refs.lookup_dwim(name) {
            Ok(reference) => reference.target_id(),
            Err(Error::ReferenceNotFound(_)) if looks_like_object_id(name) => {
                refs.database().expand(name)
            }
            Err(Error::ReferenceNotFound(_)) => Err(Error::UnknownRevision(name.to_string())),
            Err(err) => Err(err),
        }
    }

    fn first_parent(oid: ObjectId, refs: &Refs) -> Result<ObjectId> {
        let database = refs.database();
        let commit = database
            .lookup(&oid, KindFilter::Any)?
            .peel(database, ObjectType::Commit)?
            .into_commit()?;

        commit
            .parent_id(0)
            .ok_or_else(|| Error::UnknownRevision(format!("{oid}^")))
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Revision::Name(name) => write!(f, "{name}"),
            Revision::Parent(base) => write!(f, "{base}^"),
            Revision::Ancestor(base, generations) => write!(f, "{base}~{generations}"),
        }
    }
}
