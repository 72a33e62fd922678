//! Git references (branches, HEAD, tags)
//!
//! This module manages references, human-readable names pointing at objects.
//! References can be:
//! - Direct: holding an object ID
//! - Symbolic: naming another reference (e.g., HEAD -> refs/heads/master)
//!
//! ## Handles
//!
//! [`Refs::lookup`] and the `create*` methods return a [`Reference`] handle
//! borrowing the store. Mutations go through the handle and are written to
//! the backend immediately. Deleting through a handle leaves it permanently
//! invalid: every later call on it fails with `InvalidatedReference`.
//!
//! ## Resolution
//!
//! Symbolic chains are followed until a direct reference is reached. A chain
//! that revisits a name, or is longer than [`MAX_SYMBOLIC_DEPTH`], fails with
//! `ResolutionCycle`.

use crate::areas::database::Database;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::{KindFilter, ObjectType};
use crate::artifacts::objects::{HEX_SIZE, MIN_PREFIX_LEN};
use crate::artifacts::refs::ref_name::RefName;
use crate::artifacts::refs::ref_target::RefTarget;
use crate::artifacts::refs::{HEAD_REF_NAME, REF_ALIASES};
use crate::errors::{Error, Result};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

/// Longest symbolic chain followed before giving up
pub const MAX_SYMBOLIC_DEPTH: usize = 10;

/// Places a short name is looked for, in order, by [`Refs::lookup_dwim`]
const DWIM_RULES: [&str; 6] = [
    "{}",
    "refs/{}",
    "refs/tags/{}",
    "refs/heads/{}",
    "refs/remotes/{}",
    "refs/remotes/{}/HEAD",
];

/// Storage capability behind [`Refs`]
pub trait RefBackend: Debug + Send + Sync {
    fn read(&self, name: &RefName) -> Result<Option<RefTarget>>;

    /// Create or overwrite `name`
    fn write(&self, name: &RefName, target: &RefTarget) -> Result<()>;

    /// Remove `name`, returning whether it existed
    fn remove(&self, name: &RefName) -> Result<bool>;

    /// Every stored name, sorted
    fn names(&self) -> Result<Vec<RefName>>;
}

/// Git references manager
#[derive(Debug, Clone)]
pub struct Refs {
    backend: Arc<dyn RefBackend>,
    database: Database,
}

impl Refs {
    pub fn new(backend: Arc<dyn RefBackend>, database: Database) -> Self {
        Refs { backend, database }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Look a reference up by its full name
    pub fn lookup(&self, name: &str) -> Result<Reference<'_>> {
        let name = RefName::try_parse(name)?;
        let target = self
            .backend
            .read(&name)?
            .ok_or_else(|| Error::ReferenceNotFound(name.to_string()))?;

        Ok(Reference::new(self, name, target))
    }

    /// Look a reference up by a short name, the way `git rev-parse` does
    ///
    /// `main` finds `refs/heads/main`, `v1` finds `refs/tags/v1`, `origin`
    /// finds `refs/remotes/origin/HEAD` and `@` finds `HEAD`.
    pub fn lookup_dwim(&self, shorthand: &str) -> Result<Reference<'_>> {
        let shorthand = REF_ALIASES.get(shorthand).copied().unwrap_or(shorthand);

        for rule in DWIM_RULES {
            let Ok(name) = RefName::try_parse(rule.replace("{}", shorthand)) else {
                continue;
            };
            if let Some(target) = self.backend.read(&name)? {
                return Ok(Reference::new(self, name, target));
            }
        }

        Err(Error::ReferenceNotFound(shorthand.to_string()))
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.backend.read(&RefName::try_parse(name)?)?.is_some())
    }

    /// Create a reference, guessing its kind from `target`
    ///
    /// A target made only of hex digits, between [`MIN_PREFIX_LEN`] and
    /// [`HEX_SIZE`] characters long, is expanded to an object ID and makes a
    /// direct reference. Anything else is taken as the name of another
    /// reference.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` when `name` exists and `force` is not set.
    pub fn create(&self, name: &str, target: &str, force: bool) -> Result<Reference<'_>> {
        if looks_like_object_id(target) {
            let oid = self.database.expand(target)?;
            self.create_direct(name, oid, force)
        } else {
            self.create_symbolic(name, target, force)
        }
    }

    /// Create a reference pointing at an existing object
    pub fn create_direct(&self, name: &str, oid: ObjectId, force: bool) -> Result<Reference<'_>> {
        if !self.database.contains(&oid)? {
            return Err(Error::ObjectNotFound(oid));
        }

        self.write_new(name, RefTarget::Direct(oid), force)
    }

    /// Create a reference naming another reference, which need not exist yet
    pub fn create_symbolic(&self, name: &str, target: &str, force: bool) -> Result<Reference<'_>> {
        self.write_new(name, RefTarget::Symbolic(RefName::try_parse(target)?), force)
    }

    fn write_new(&self, name: &str, target: RefTarget, force: bool) -> Result<Reference<'_>> {
        let name = RefName::try_parse(name)?;

        if !force && self.backend.read(&name)?.is_some() {
            return Err(Error::AlreadyExists(name.to_string()));
        }

        self.backend.write(&name, &target)?;
        tracing::debug!(%name, %target, force, "created reference");

        Ok(Reference::new(self, name, target))
    }

    /// Every reference name, in lexicographic order
    ///
    /// The names are read once; iterating does not touch the backend again.
    /// Call again (or clone the iterator) to start over.
    pub fn list_all(&self) -> Result<ReferenceNames> {
        let mut names = self.backend.names()?;
        names.sort();

        Ok(ReferenceNames {
            names: names.into_iter(),
        })
    }

    /// Follow `target` until a direct reference is reached
    ///
    /// Returns the name of that direct reference and its object ID.
    fn resolve_target(&self, name: &RefName, target: &RefTarget) -> Result<(RefName, ObjectId)> {
        let mut visited = HashSet::from([name.clone()]);
        let mut current_name = name.clone();
        let mut current_target = target.clone();

        loop {
            match current_target {
                RefTarget::Direct(oid) => return Ok((current_name, oid)),
                RefTarget::Symbolic(next) => {
                    if !visited.insert(next.clone()) || visited.len() > MAX_SYMBOLIC_DEPTH {
                        return Err(Error::ResolutionCycle(name.to_string()));
                    }

                    current_target = self
                        .backend
                        .read(&next)?
                        .ok_or_else(|| Error::ReferenceNotFound(next.to_string()))?;
                    current_name = next;
                }
            }
        }
    }

    /// Object ID a reference ultimately points at
    pub fn resolve_name(&self, name: &str) -> Result<ObjectId> {
        self.lookup(name)?.target_id()
    }

    /// Names grouped by the object ID they resolve to
    ///
    /// References that cannot be resolved are skipped.
    pub fn reverse_refs(&self) -> Result<HashMap<ObjectId, Vec<RefName>>> {
        Ok(self
            .list_all()?
            .fold(HashMap::new(), |mut acc, name| {
                if let Ok(oid) = self.resolve_name(name.as_str()) {
                    acc.entry(oid).or_insert_with(Vec::new).push(name);
                }
                acc
            }))
    }
}

/// Whether text should be read as an abbreviated or full object ID
pub(crate) fn looks_like_object_id(text: &str) -> bool {
    (MIN_PREFIX_LEN..=HEX_SIZE).contains(&text.len())
        && text.chars().all(|c| c.is_ascii_hexdigit())
}

/// Ordered, finite sequence of reference names
#[derive(Debug, Clone)]
pub struct ReferenceNames {
    names: std::vec::IntoIter<RefName>,
}

impl Iterator for ReferenceNames {
    type Item = RefName;

    fn next(&mut self) -> Option<Self::Item> {
        self.names.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.names.size_hint()
    }
}

impl ExactSizeIterator for ReferenceNames {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceState {
    Valid { name: RefName, target: RefTarget },
    /// The reference was deleted through this handle
    Invalidated,
}

/// Handle on one reference, borrowing its [`Refs`] store
#[derive(Debug, Clone)]
pub struct Reference<'r> {
    refs: &'r Refs,
    state: ReferenceState,
}

impl<'r> Reference<'r> {
    fn new(refs: &'r Refs, name: RefName, target: RefTarget) -> Self {
        Reference {
            refs,
            state: ReferenceState::Valid { name, target },
        }
    }

    fn valid(&self) -> Result<(&RefName, &RefTarget)> {
        match &self.state {
            ReferenceState::Valid { name, target } => Ok((name, target)),
            ReferenceState::Invalidated => Err(Error::InvalidatedReference),
        }
    }

    pub fn state(&self) -> &ReferenceState {
        &self.state
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.state, ReferenceState::Valid { .. })
    }

    pub fn name(&self) -> Result<&str> {
        Ok(self.valid()?.0.as_str())
    }

    pub fn ref_name(&self) -> Result<&RefName> {
        Ok(self.valid()?.0)
    }

    pub fn target(&self) -> Result<&RefTarget> {
        Ok(self.valid()?.1)
    }

    pub fn is_symbolic(&self) -> Result<bool> {
        Ok(self.target()?.is_symbolic())
    }

    pub fn shorthand(&self) -> Result<&str> {
        Ok(self.ref_name()?.shorthand())
    }

    pub fn is_branch(&self) -> Result<bool> {
        Ok(self.ref_name()?.is_branch())
    }

    pub fn is_tag(&self) -> Result<bool> {
        Ok(self.ref_name()?.is_tag())
    }

    pub fn is_remote(&self) -> Result<bool> {
        Ok(self.ref_name()?.is_remote())
    }

    /// The direct reference at the end of this reference's chain
    ///
    /// A direct reference resolves to itself, returned borrowed. A symbolic
    /// one resolves to a new handle on the last reference of its chain.
    ///
    /// # Errors
    ///
    /// - `ResolutionCycle` when the chain loops or is too deep
    /// - `ReferenceNotFound` when the chain ends at a missing name
    pub fn resolve(&self) -> Result<Cow<'_, Reference<'r>>> {
        let (name, target) = self.valid()?;

        match target {
            RefTarget::Direct(_) => Ok(Cow::Borrowed(self)),
            RefTarget::Symbolic(_) => {
                let (resolved_name, oid) = self.refs.resolve_target(name, target)?;
                tracing::trace!(%name, resolved = %resolved_name, %oid, "resolved reference");

                Ok(Cow::Owned(Reference::new(
                    self.refs,
                    resolved_name,
                    RefTarget::Direct(oid),
                )))
            }
        }
    }

    /// Object ID at the end of the chain
    pub fn target_id(&self) -> Result<ObjectId> {
        let resolved = self.resolve()?;
        match resolved.target()? {
            RefTarget::Direct(oid) => Ok(*oid),
            RefTarget::Symbolic(name) => Err(Error::ReferenceNotFound(name.to_string())),
        }
    }

    /// Resolve, then peel the object to `kind`
    pub fn peel(&self, kind: ObjectType) -> Result<Object> {
        let database = self.refs.database();
        database
            .lookup(&self.target_id()?, KindFilter::Any)?
            .peel(database, kind)
    }

    /// Point the reference somewhere else, keeping its kind
    ///
    /// # Errors
    ///
    /// `ReferenceTypeMismatch` when `target` is direct and the reference is
    /// symbolic, or the other way round.
    pub fn set_target(&mut self, target: impl Into<RefTarget>) -> Result<()> {
        let target = target.into();
        let (name, current) = self.valid()?;

        if !current.same_variant(&target) {
            return Err(Error::ReferenceTypeMismatch {
                name: name.to_string(),
                actual: current.kind_name(),
                given: target.kind_name(),
            });
        }
        if let RefTarget::Direct(oid) = &target
            && !self.refs.database.contains(oid)?
        {
            return Err(Error::ObjectNotFound(*oid));
        }

        self.refs.backend.write(name, &target)?;
        tracing::debug!(%name, from = %current, to = %target, "updated reference");

        let name = name.clone();
        self.state = ReferenceState::Valid { name, target };
        Ok(())
    }

    /// Like [`set_target`](Self::set_target), reading `target` according to
    /// the reference's own kind: an object ID or prefix for a direct
    /// reference, a reference name for a symbolic one.
    pub fn set_target_str(&mut self, target: &str) -> Result<()> {
        let target = match self.target()? {
            RefTarget::Direct(_) => RefTarget::Direct(self.refs.database.expand(target)?),
            RefTarget::Symbolic(_) => RefTarget::Symbolic(RefName::try_parse(target)?),
        };

        self.set_target(target)
    }

    /// Move the reference to `new_name`, keeping its kind and target
    ///
    /// `HEAD` follows a branch it was attached to.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` when `new_name` is taken and `force` is not set.
    pub fn rename(&mut self, new_name: &str, force: bool) -> Result<()> {
        let (old_name, target) = self.valid()?;
        let new_name = RefName::try_parse(new_name)?;
        if &new_name == old_name {
            return Ok(());
        }

        let backend = &self.refs.backend;
        let previous = backend.read(&new_name)?;
        if previous.is_some() && !force {
            return Err(Error::AlreadyExists(new_name.to_string()));
        }

        backend.write(&new_name, target)?;
        if let Err(err) = backend.remove(old_name) {
            let rollback = match &previous {
                Some(previous) => backend.write(&new_name, previous),
                None => backend.remove(&new_name).map(|_| ()),
            };
            if let Err(rollback_err) = rollback {
                tracing::warn!(%new_name, error = %rollback_err, "failed to roll back rename");
            }
            return Err(err);
        }

        let head = RefName::try_parse(HEAD_REF_NAME)?;
        if backend.read(&head)? == Some(RefTarget::Symbolic(old_name.clone())) {
            backend.write(&head, &RefTarget::Symbolic(new_name.clone()))?;
        }

        tracing::debug!(from = %old_name, to = %new_name, force, "renamed reference");
        let target = target.clone();
        self.state = ReferenceState::Valid {
            name: new_name,
            target,
        };
        Ok(())
    }

    /// Remove the reference; the handle is unusable afterwards
    pub fn delete(&mut self) -> Result<()> {
        let (name, _) = self.valid()?;

        if !self.refs.backend.remove(name)? {
            return Err(Error::ReferenceNotFound(name.to_string()));
        }

        tracing::debug!(%name, "deleted reference");
        self.state = ReferenceState::Invalidated;
        Ok(())
    }
}

impl PartialEq for Reference<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

impl Eq for Reference<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::areas::backends::memory::{MemoryObjectStore, MemoryRefBackend};
    use crate::artifacts::objects::blob::Blob;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn refs() -> Refs {
        let database = Database::new(Arc::new(MemoryObjectStore::default()));
        Refs::new(Arc::new(MemoryRefBackend::default()), database)
    }

    fn store_blob(refs: &Refs, content: &str) -> ObjectId {
        refs.database().write(&Blob::new(content.to_string())).unwrap()
    }

    #[rstest]
    #[case("abcd", true)]
    #[case("ABCDEF0123", true)]
    #[case("abc", false)]
    #[case("refs/heads/main", false)]
    #[case("deadbeefx", false)]
    fn test_object_id_guess(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(looks_like_object_id(text), expected);
    }

    #[rstest]
    fn test_create_guesses_kind(refs: Refs) {
        let oid = store_blob(&refs, "a");

        let direct = refs.create("refs/heads/main", &oid.short(), false).unwrap();
        assert_eq!(direct.target().unwrap(), &RefTarget::Direct(oid));

        let symbolic = refs.create("HEAD", "refs/heads/main", false).unwrap();
        assert!(symbolic.is_symbolic().unwrap());
    }

    #[rstest]
    fn test_direct_resolves_to_itself(refs: Refs) {
        let oid = store_blob(&refs, "a");
        let direct = refs.create_direct("refs/heads/main", oid, false).unwrap();

        let resolved = direct.resolve().unwrap();
        assert!(matches!(resolved, Cow::Borrowed(r) if std::ptr::eq(r, &direct)));
    }

    #[rstest]
    fn test_cycle_is_detected(refs: Refs) {
        refs.create_symbolic("refs/heads/a", "refs/heads/b", false).unwrap();
        let b = refs.create_symbolic("refs/heads/b", "refs/heads/a", false).unwrap();

        assert!(matches!(
            b.resolve(),
            Err(Error::ResolutionCycle(name)) if name == "refs/heads/b"
        ));
    }

    #[rstest]
    fn test_chain_deeper_than_limit_fails(refs: Refs) {
        let oid = store_blob(&refs, "a");
        refs.create_direct("refs/chain/0", oid, false).unwrap();
        for n in 1..=MAX_SYMBOLIC_DEPTH {
            refs.create_symbolic(
                &format!("refs/chain/{n}"),
                &format!("refs/chain/{}", n - 1),
                false,
            )
            .unwrap();
        }

        let top = refs.lookup(&format!("refs/chain/{MAX_SYMBOLIC_DEPTH}")).unwrap();
        assert!(matches!(top.resolve(), Err(Error::ResolutionCycle(_))));

        let below = refs
            .lookup(&format!("refs/chain/{}", MAX_SYMBOLIC_DEPTH - 1))
            .unwrap();
        assert_eq!(below.target_id().unwrap(), oid);
    }

    #[rstest]
    fn test_set_target_rejects_other_kind(refs: Refs) {
        let oid = store_blob(&refs, "a");
        refs.create_direct("refs/heads/main", oid, false).unwrap();
        let mut head = refs.create_symbolic("HEAD", "refs/heads/main", false).unwrap();

        let err = head.set_target(oid).unwrap_err();
        assert!(matches!(
            err,
            Error::ReferenceTypeMismatch {
                actual: "symbolic",
                given: "direct",
                ..
            }
        ));
        assert_eq!(
            head.target().unwrap(),
            &RefTarget::Symbolic(RefName::try_parse("refs/heads/main").unwrap())
        );
    }

    #[rstest]
    fn test_set_target_str_follows_own_kind(refs: Refs) {
        let first = store_blob(&refs, "a");
        let second = store_blob(&refs, "b");
        let mut main = refs.create_direct("refs/heads/main", first, false).unwrap();

        main.set_target_str(&second.short()).unwrap();
        assert_eq!(refs.resolve_name("refs/heads/main").unwrap(), second);
    }

    #[rstest]
    fn test_rename_moves_head_along(refs: Refs) {
        let oid = store_blob(&refs, "a");
        let mut main = refs.create_direct("refs/heads/main", oid, false).unwrap();
        refs.create_symbolic("HEAD", "refs/heads/main", false).unwrap();

        main.rename("refs/heads/trunk", false).unwrap();

        assert_eq!(main.name().unwrap(), "refs/heads/trunk");
        assert_eq!(
            refs.lookup("HEAD").unwrap().target().unwrap(),
            &RefTarget::Symbolic(RefName::try_parse("refs/heads/trunk").unwrap())
        );
        assert!(!refs.contains("refs/heads/main").unwrap());
    }

    #[rstest]
    fn test_dwim_lookup(refs: Refs) {
        let oid = store_blob(&refs, "a");
        refs.create_direct("refs/heads/main", oid, false).unwrap();
        refs.create_direct("refs/tags/v1", oid, false).unwrap();
        refs.create_symbolic("HEAD", "refs/heads/main", false).unwrap();

        assert_eq!(refs.lookup_dwim("main").unwrap().name().unwrap(), "refs/heads/main");
        assert_eq!(refs.lookup_dwim("v1").unwrap().name().unwrap(), "refs/tags/v1");
        assert_eq!(refs.lookup_dwim("@").unwrap().name().unwrap(), "HEAD");
        assert!(refs.lookup_dwim("nope").unwrap_err().is_not_found());
    }

    #[rstest]
    fn test_reverse_refs_groups_by_object(refs: Refs) {
        let oid = store_blob(&refs, "a");
        refs.create_direct("refs/heads/main", oid, false).unwrap();
        refs.create_symbolic("HEAD", "refs/heads/main", false).unwrap();
        refs.create_symbolic("refs/heads/dangling", "refs/heads/gone", false)
            .unwrap();

        let reverse = refs.reverse_refs().unwrap();
        let names: Vec<_> = reverse[&oid].iter().map(RefName::as_str).collect();
        assert_eq!(names, vec!["HEAD", "refs/heads/main"]);
        assert_eq!(reverse.len(), 1);
    }
}
