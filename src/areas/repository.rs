use crate::areas::backends::loose::{LooseObjectStore, LooseRefBackend};
use crate::areas::backends::memory::{MemoryObjectStore, MemoryRefBackend};
use crate::areas::database::{Database, ObjectStore};
use crate::areas::refs::{RefBackend, Reference, ReferenceNames, Refs};
use crate::artifacts::log::describe::{DescribeOptions, DescribeResult, describe};
use crate::artifacts::log::rev_walk::{RevWalk, SortMode};
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::{KindFilter, ObjectType};
use crate::artifacts::refs::HEAD_REF_NAME;
use crate::artifacts::refs::revision::Revision;
use crate::errors::{Error, Result};
use std::path::Path;
use std::sync::Arc;

/// One object store and one reference store
#[derive(Debug)]
pub struct Repository {
    refs: Refs,
}

impl Repository {
    pub fn new(objects: Arc<dyn ObjectStore>, references: Arc<dyn RefBackend>) -> Self {
        let database = Database::new(objects);

        Repository {
            refs: Refs::new(references, database),
        }
    }

    /// Empty repository held in memory
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryObjectStore::default()),
            Arc::new(MemoryRefBackend::default()),
        )
    }

    /// Repository over an existing `.git`-style directory
    ///
    /// # Errors
    ///
    /// `Io` with `NotFound` when `git_dir` has no `objects` directory.
    pub fn open_loose(git_dir: impl AsRef<Path>) -> Result<Self> {
        let git_dir = git_dir.as_ref();
        let objects_dir = git_dir.join("objects");

        if !objects_dir.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("not a git directory: {}", git_dir.display()),
            )));
        }
        tracing::debug!(path = %git_dir.display(), "opening loose repository");

        Ok(Self::new(
            Arc::new(LooseObjectStore::new(objects_dir.into_boxed_path())),
            Arc::new(LooseRefBackend::new(git_dir.to_path_buf().into_boxed_path())),
        ))
    }

    pub fn database(&self) -> &Database {
        self.refs.database()
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    /// The direct reference `HEAD` resolves to
    ///
    /// # Errors
    ///
    /// `ReferenceNotFound` when `HEAD` is missing or names an unborn branch.
    pub fn head(&self) -> Result<Reference<'_>> {
        let head = self.refs.lookup(HEAD_REF_NAME)?;
        let resolved = head.resolve()?.into_owned();

        Ok(resolved)
    }

    /// Whether `HEAD` points at a branch with no commits yet
    pub fn head_is_unborn(&self) -> Result<bool> {
        match self.head() {
            Ok(_) => Ok(false),
            Err(Error::ReferenceNotFound(name)) => Ok(name != HEAD_REF_NAME),
            Err(err) => Err(err),
        }
    }

    /// Whether the repository has no resolvable `HEAD`
    pub fn is_empty(&self) -> Result<bool> {
        match self.head() {
            Ok(_) => Ok(false),
            Err(Error::ReferenceNotFound(_)) => Ok(true),
            Err(err) => Err(err),
        }
    }

    pub fn lookup_reference(&self, name: &str) -> Result<Reference<'_>> {
        self.refs.lookup(name)
    }

    /// Look a reference up by short name (`main`, `v1.0`, `origin/main`)
    pub fn lookup_reference_dwim(&self, shorthand: &str) -> Result<Reference<'_>> {
        self.refs.lookup_dwim(shorthand)
    }

    /// Create a reference
    ///
    /// A `target` of 4 to 40 hex digits is expanded to the object it
    /// abbreviates and makes a direct reference. Anything else is stored as
    /// a symbolic target.
    pub fn create_reference(&self, name: &str, target: &str, force: bool) -> Result<Reference<'_>> {
        self.refs.create(name, target, force)
    }

    pub fn listall_references(&self) -> Result<ReferenceNames> {
        self.refs.list_all()
    }

    /// Object named by a full or abbreviated hex ID, `None` when absent
    ///
    /// # Errors
    ///
    /// `Ambiguous` when the prefix matches several objects and `InvalidLength`
    /// or `InvalidHex` when it is malformed.
    pub fn get(&self, prefix: &str) -> Result<Option<Object>> {
        match self.database().lookup_prefix(prefix, KindFilter::Any) {
            Ok(object) => Ok(Some(object)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn contains(&self, prefix: &str) -> Result<bool> {
        Ok(self.get(prefix)?.is_some())
    }

    /// Object a revision expression (`main~2`, `v1.0^`, `abc1234`) names
    pub fn revparse_single(&self, revision: &str) -> Result<Object> {
        let oid = Revision::try_parse(revision)?.resolve(&self.refs)?;

        self.database().lookup(&oid, KindFilter::Any)
    }

    /// Walker configured with `sort`, started at `oid` when given
    pub fn walk(&self, oid: Option<&ObjectId>, sort: SortMode) -> Result<RevWalk<'_>> {
        let mut walk = RevWalk::new(&self.refs);
        walk.sort(sort);

        if let Some(oid) = oid {
            walk.push(oid)?;
        }

        Ok(walk)
    }

    /// Name a commit after the nearest reference; `HEAD` when no commitish is given
    pub fn describe(&self, commitish: Option<&str>, options: &DescribeOptions) -> Result<DescribeResult> {
        let commit = self
            .revparse_single(commitish.unwrap_or(HEAD_REF_NAME))?
            .peel(self.database(), ObjectType::Commit)?;

        describe(&self.refs, commit.id(), options)
    }
}
