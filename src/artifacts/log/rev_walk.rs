//! Revision walker
//!
//! [`RevWalk`] yields the commits reachable from a set of pushed commits and
//! not reachable from any hidden one.
//!
//! ## Algorithm
//!
//! Commits wait in a priority queue ordered by committer time, newest first,
//! with ties going to the commit queued first. Popping a commit queues its
//! parents. Hidden commits travel through the same queue marked
//! UNINTERESTING and pass the mark on to every parent, so anything they reach
//! is never yielded.
//!
//! Commit times say nothing reliable about ancestry, so a hidden path can
//! reach a commit after it was popped as interesting. The mark then spreads
//! back through everything already popped below it. A walk with hidden
//! commits is therefore limited first: the whole queue is drained, hidden
//! frontier included, and only commits still unmarked are yielded.
//!
//! Date order without hidden commits needs nothing else and commits are
//! yielded as they are popped. [`SortMode::TOPOLOGICAL`] and
//! [`SortMode::REVERSE`] need the whole set too, so they share the limited
//! walk and then sort the result with Kahn's algorithm and/or reverse it.
//!
//! ## Configuration
//!
//! Sorting and first-parent simplification are read when iteration starts and
//! survive [`RevWalk::reset`]. A `push` or `hide` after iteration started
//! applies to the commits not yielded yet. After [`WalkStep::End`] both fail
//! with [`Error::WalkEnded`] until the walker is reset.

use crate::areas::refs::Refs;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::{KindFilter, ObjectType};
use crate::artifacts::refs::HEAD_REF_NAME;
use crate::artifacts::refs::revision::Revision;
use crate::errors::{Error, Result};
use bitflags::bitflags;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

bitflags! {
    /// Order in which commits are yielded
    ///
    /// `NONE` and `TIME` both yield newest commits first. `TOPOLOGICAL` never
    /// yields a parent before all of its children. `REVERSE` flips whichever
    /// order the other flags select.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SortMode: u32 {
        const NONE = 0;
        const TOPOLOGICAL = 1 << 0;
        const TIME = 1 << 1;
        const REVERSE = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    struct CommitFlags: u8 {
        /// Queued at least once
        const SEEN = 0b001;
        /// Reachable from a hidden commit
        const UNINTERESTING = 0b010;
        /// Popped, parents already queued
        const POPPED = 0b100;
    }
}

/// Result of one walker step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkStep {
    Commit(Commit),
    /// Nothing is left; repeated until the walker is reset
    End,
}

impl WalkStep {
    pub fn is_end(&self) -> bool {
        matches!(self, WalkStep::End)
    }

    pub fn into_commit(self) -> Option<Commit> {
        match self {
            WalkStep::Commit(commit) => Some(commit),
            WalkStep::End => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct QueueEntry {
    time: i64,
    sequence: u64,
    oid: ObjectId,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Queue and per-commit marks of one walk
#[derive(Debug, Clone, Default)]
struct Traversal {
    queue: BinaryHeap<QueueEntry>,
    flags: HashMap<ObjectId, CommitFlags>,
    commits: HashMap<ObjectId, Commit>,
    sequence: u64,
    /// Interesting commits in the order they were popped
    popped: Vec<ObjectId>,
    /// Parents of late-marked commits that were never queued
    unqueued: Vec<ObjectId>,
    has_hidden: bool,
}

impl Traversal {
    fn flags(&self, oid: &ObjectId) -> CommitFlags {
        self.flags.get(oid).copied().unwrap_or_default()
    }

    fn enqueue(&mut self, commit: Commit, uninteresting: bool) {
        let oid = commit.id();
        self.has_hidden |= uninteresting;

        if self.flags(&oid).contains(CommitFlags::SEEN) {
            if uninteresting {
                self.mark_uninteresting(oid);
            }
            return;
        }

        let mut flags = CommitFlags::SEEN;
        flags.set(CommitFlags::UNINTERESTING, uninteresting);
        self.flags.insert(oid, flags);

        self.queue.push(QueueEntry {
            time: commit.commit_time(),
            sequence: self.sequence,
            oid,
        });
        self.sequence += 1;
        self.commits.insert(oid, commit);
    }

    /// Mark `oid` and every already-popped ancestor reached through it
    ///
    /// Parents a popped commit never queued (first-parent walks skip them)
    /// are left in `unqueued` for the next step to load.
    fn mark_uninteresting(&mut self, oid: ObjectId) {
        let mut pending = vec![oid];

        while let Some(oid) = pending.pop() {
            let flags = self.flags.entry(oid).or_default();
            if flags.contains(CommitFlags::UNINTERESTING) {
                continue;
            }
            flags.insert(CommitFlags::UNINTERESTING);

            if flags.contains(CommitFlags::POPPED)
                && let Some(commit) = self.commits.get(&oid)
            {
                for parent in commit.parent_ids() {
                    if self.flags(parent).contains(CommitFlags::SEEN) {
                        pending.push(*parent);
                    } else {
                        self.unqueued.push(*parent);
                    }
                }
            }
        }
    }

    fn queue_unqueued(&mut self, refs: &Refs) -> Result<()> {
        while let Some(oid) = self.unqueued.last().copied() {
            if self.flags(&oid).contains(CommitFlags::SEEN) {
                self.unqueued.pop();
                self.mark_uninteresting(oid);
                continue;
            }

            let commit = refs.database().lookup_commit(&oid)?;
            self.unqueued.pop();
            self.enqueue(commit, true);
        }

        Ok(())
    }

    /// Pop commits until an interesting one is found
    ///
    /// If loading a parent fails, the popped entry goes back into the queue
    /// before the error is returned.
    fn step(&mut self, refs: &Refs, first_parent: bool) -> Result<Option<Commit>> {
        loop {
            self.queue_unqueued(refs)?;
            let Some(entry) = self.queue.pop() else {
                return Ok(None);
            };

            let uninteresting = self.flags(&entry.oid).contains(CommitFlags::UNINTERESTING);
            let Some(commit) = self.commits.get(&entry.oid).cloned() else {
                return Err(Error::ObjectNotFound(entry.oid));
            };

            let parent_limit = if first_parent && !uninteresting {
                1
            } else {
                usize::MAX
            };
            let parent_ids: Vec<ObjectId> = commit
                .parent_ids()
                .iter()
                .take(parent_limit)
                .copied()
                .collect();

            let mut loaded = Vec::new();
            for parent in &parent_ids {
                if self.flags(parent).contains(CommitFlags::SEEN) {
                    continue;
                }
                match refs.database().lookup_commit(parent) {
                    Ok(parent_commit) => loaded.push(parent_commit),
                    Err(err) => {
                        self.queue.push(entry);
                        return Err(err);
                    }
                }
            }

            self.flags
                .entry(entry.oid)
                .or_default()
                .insert(CommitFlags::POPPED);

            if uninteresting {
                for parent in &parent_ids {
                    if self.flags(parent).contains(CommitFlags::SEEN) {
                        self.mark_uninteresting(*parent);
                    }
                }
            }
            for parent_commit in loaded {
                self.enqueue(parent_commit, uninteresting);
            }

            if !uninteresting {
                self.popped.push(entry.oid);
                return Ok(Some(commit));
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Phase {
    /// Nothing prepared; the next step picks streaming or a limited walk
    Idle,
    Streaming,
    Buffered(VecDeque<Commit>),
    Exhausted,
}

/// Stateful commit-graph traversal
#[derive(Debug, Clone)]
pub struct RevWalk<'r> {
    refs: &'r Refs,
    sorting: SortMode,
    first_parent: bool,
    phase: Phase,
    traversal: Traversal,
    yielded: HashSet<ObjectId>,
}

impl<'r> RevWalk<'r> {
    pub fn new(refs: &'r Refs) -> Self {
        RevWalk {
            refs,
            sorting: SortMode::NONE,
            first_parent: false,
            phase: Phase::Idle,
            traversal: Traversal::default(),
            yielded: HashSet::new(),
        }
    }

    pub fn sorting(&self) -> SortMode {
        self.sorting
    }

    /// Select the output order for the next walk
    pub fn sort(&mut self, mode: SortMode) {
        self.sorting = mode;
    }

    /// Follow only the first parent of every yielded commit
    pub fn simplify_first_parent(&mut self) {
        self.first_parent = true;
    }

    /// Start the walk at the commit `oid` names
    ///
    /// Annotated tags are peeled to the commit they point at.
    ///
    /// # Errors
    ///
    /// - `CannotPeel` or `TypeMismatch` when `oid` names something other
    ///   than a commit or a tag of one
    /// - `WalkEnded` once the walk has returned [`WalkStep::End`]
    pub fn push(&mut self, oid: &ObjectId) -> Result<()> {
        self.add(oid, false)
    }

    /// Exclude the commit `oid` names and all of its ancestors
    ///
    /// After iteration started this drops the ancestors not yielded yet.
    pub fn hide(&mut self, oid: &ObjectId) -> Result<()> {
        self.add(oid, true)
    }

    /// [`push`](Self::push) the commit a reference resolves to
    pub fn push_ref(&mut self, name: &str) -> Result<()> {
        let oid = self.refs.resolve_name(name)?;
        self.push(&oid)
    }

    pub fn hide_ref(&mut self, name: &str) -> Result<()> {
        let oid = self.refs.resolve_name(name)?;
        self.hide(&oid)
    }

    pub fn push_head(&mut self) -> Result<()> {
        self.push_ref(HEAD_REF_NAME)
    }

    pub fn hide_head(&mut self) -> Result<()> {
        self.hide_ref(HEAD_REF_NAME)
    }

    /// [`push`](Self::push) a revision expression: a short or full reference
    /// name, an object ID prefix, `HEAD~2`, ...
    pub fn push_revision(&mut self, revision: &str) -> Result<()> {
        let oid = Revision::try_parse(revision)?.resolve(self.refs)?;
        self.push(&oid)
    }

    pub fn hide_revision(&mut self, revision: &str) -> Result<()> {
        let oid = Revision::try_parse(revision)?.resolve(self.refs)?;
        self.hide(&oid)
    }

    fn add(&mut self, oid: &ObjectId, uninteresting: bool) -> Result<()> {
        if matches!(self.phase, Phase::Exhausted) {
            return Err(Error::WalkEnded);
        }

        let database = self.refs.database();
        let commit = database
            .lookup(oid, KindFilter::Any)?
            .peel(database, ObjectType::Commit)?
            .into_commit()?;

        tracing::trace!(oid = %commit.id(), uninteresting, "added walk root");
        self.traversal.enqueue(commit, uninteresting);

        // the prepared order no longer holds, rebuild it at the next step
        if matches!(self.phase, Phase::Buffered(_))
            || (matches!(self.phase, Phase::Streaming) && uninteresting)
        {
            tracing::debug!(yielded = self.yielded.len(), "walk changed while iterating");
            self.phase = Phase::Idle;
        }

        Ok(())
    }

    /// Forget pushed and hidden commits and start over
    ///
    /// Sorting and first-parent simplification are kept.
    pub fn reset(&mut self) {
        self.traversal = Traversal::default();
        self.yielded.clear();
        self.phase = Phase::Idle;
    }

    /// Advance the walk by one commit
    ///
    /// Returns [`WalkStep::End`] once every reachable commit has been
    /// yielded, and keeps returning it until [`reset`](Self::reset). When
    /// loading a commit fails the error is returned and the walker is left
    /// as it was, so the step can be retried.
    pub fn next_step(&mut self) -> Result<WalkStep> {
        if matches!(self.phase, Phase::Idle) {
            self.phase = if self.needs_full_walk() {
                Phase::Buffered(self.ordered_commits()?)
            } else {
                Phase::Streaming
            };
        }

        let next = match &mut self.phase {
            Phase::Streaming => self.traversal.step(self.refs, self.first_parent)?,
            Phase::Buffered(commits) => commits.pop_front(),
            Phase::Idle | Phase::Exhausted => None,
        };

        match next {
            Some(commit) => {
                self.yielded.insert(commit.id());
                Ok(WalkStep::Commit(commit))
            }
            None => {
                self.phase = Phase::Exhausted;
                Ok(WalkStep::End)
            }
        }
    }

    fn needs_full_walk(&self) -> bool {
        self.traversal.has_hidden
            || self
                .sorting
                .intersects(SortMode::TOPOLOGICAL | SortMode::REVERSE)
    }

    /// Drain the queue, hidden frontier included, and put the commits not
    /// yielded yet in the configured order
    fn ordered_commits(&mut self) -> Result<VecDeque<Commit>> {
        let mut traversal = self.traversal.clone();
        while traversal.step(self.refs, self.first_parent)?.is_some() {}

        let mut commits: Vec<Commit> = traversal
            .popped
            .iter()
            .filter(|oid| {
                !self.yielded.contains(*oid)
                    && !traversal.flags(oid).contains(CommitFlags::UNINTERESTING)
            })
            .filter_map(|oid| traversal.commits.get(oid).cloned())
            .collect();
        self.traversal = traversal;

        if self.sorting.contains(SortMode::TOPOLOGICAL) {
            commits = self.topological_order(commits);
        }
        if self.sorting.contains(SortMode::REVERSE) {
            commits.reverse();
        }

        tracing::debug!(count = commits.len(), sorting = ?self.sorting, "prepared ordered walk");
        Ok(commits.into())
    }

    /// Kahn's algorithm over `commits`, given in pop order
    ///
    /// With `TIME` the newest ready commit goes next, earlier pops first on
    /// ties; otherwise the most recently readied one does, which keeps lines
    /// of history together.
    fn topological_order(&self, commits: Vec<Commit>) -> Vec<Commit> {
        let position: HashMap<ObjectId, usize> = commits
            .iter()
            .enumerate()
            .map(|(index, commit)| (commit.id(), index))
            .collect();

        let edges: Vec<Vec<usize>> = commits
            .iter()
            .map(|commit| {
                let limit = if self.first_parent { 1 } else { usize::MAX };
                commit
                    .parent_ids()
                    .iter()
                    .take(limit)
                    .filter_map(|parent| position.get(parent).copied())
                    .collect()
            })
            .collect();

        let mut indegree = vec![0usize; commits.len()];
        for parents in &edges {
            for &parent in parents {
                indegree[parent] += 1;
            }
        }

        let by_time = self.sorting.contains(SortMode::TIME);
        let time = |index: usize| commits[index].commit_time();
        let mut ready_by_time: BinaryHeap<(i64, Reverse<usize>)> = BinaryHeap::new();
        let mut ready_stack: Vec<usize> = Vec::new();
        for index in (0..commits.len()).rev() {
            if indegree[index] == 0 {
                ready_by_time.push((time(index), Reverse(index)));
                ready_stack.push(index);
            }
        }

        let mut order = Vec::with_capacity(commits.len());
        loop {
            let next = if by_time {
                ready_by_time.pop().map(|(_, Reverse(index))| index)
            } else {
                ready_stack.pop()
            };
            let Some(index) = next else {
                break;
            };
            order.push(index);

            for &parent in edges[index].iter().rev() {
                indegree[parent] -= 1;
                if indegree[parent] == 0 {
                    ready_by_time.push((time(parent), Reverse(parent)));
                    ready_stack.push(parent);
                }
            }
        }

        let mut slots: Vec<Option<Commit>> = commits.into_iter().map(Some).collect();
        order
            .into_iter()
            .filter_map(|index| slots[index].take())
            .collect()
    }
}

impl Iterator for RevWalk<'_> {
    type Item = Result<Commit>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_step() {
            Ok(WalkStep::Commit(commit)) => Some(Ok(commit)),
            Ok(WalkStep::End) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
