//! Naming commits after the nearest reference (`git describe`)
//!
//! A commit is described by the candidate reference that needs the fewest
//! extra commits to reach it: `v1.2` when a tag points right at it,
//! `v1.2-3-gabcdef0` when it sits three commits past `v1.2`.
//!
//! Candidates are collected walking back from the commit in date order and
//! the search stops after [`DescribeOptions::max_candidates`] of them. For
//! each candidate the depth is the number of commits reachable from the
//! described commit but not from the candidate. Ties go to the candidate met
//! first.

use crate::areas::refs::Refs;
use crate::artifacts::log::rev_walk::RevWalk;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::{KindFilter, ObjectType};
use crate::artifacts::objects::{MIN_PREFIX_LEN, SHORT_ID_LENGTH};
use crate::artifacts::refs::REFS_PREFIX;
use crate::errors::{Error, Result};
use std::collections::HashMap;

/// Which references may name a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DescribeStrategy {
    /// Annotated tags only
    #[default]
    Default,
    /// Any tag, annotated or lightweight
    Tags,
    /// Any reference (`heads/main`, `tags/v1`, `remotes/origin/main`)
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeOptions {
    pub strategy: DescribeStrategy,
    /// Stop looking after this many candidates; 0 accepts exact matches only
    pub max_candidates: usize,
    /// Only consider names starting with this prefix
    pub pattern: Option<String>,
    /// Describe an unnamed commit by its abbreviated ID instead of failing
    pub show_commit_oid_as_fallback: bool,
}

impl Default for DescribeOptions {
    fn default() -> Self {
        DescribeOptions {
            strategy: DescribeStrategy::Default,
            max_candidates: 10,
            pattern: None,
            show_commit_oid_as_fallback: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeFormatOptions {
    /// Hex digits of the commit ID in the long format; 0 suppresses the long format
    pub abbreviated_size: usize,
    pub always_use_long_format: bool,
}

impl Default for DescribeFormatOptions {
    fn default() -> Self {
        DescribeFormatOptions {
            abbreviated_size: SHORT_ID_LENGTH,
            always_use_long_format: false,
        }
    }
}

/// Outcome of [`describe`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeResult {
    /// Name of the chosen reference, `None` for the ID fallback
    pub name: Option<String>,
    /// Commits between the reference and the described commit
    pub depth: usize,
    pub commit_id: ObjectId,
}

impl DescribeResult {
    pub fn format(&self, options: &DescribeFormatOptions) -> String {
        let abbrev_len = options.abbreviated_size.max(MIN_PREFIX_LEN);

        match &self.name {
            None => self.commit_id.abbrev(abbrev_len),
            Some(name) if options.abbreviated_size == 0 => name.clone(),
            Some(name) if self.depth == 0 && !options.always_use_long_format => name.clone(),
            Some(name) => format!(
                "{name}-{}-g{}",
                self.depth,
                self.commit_id.abbrev(abbrev_len)
            ),
        }
    }
}

impl std::fmt::Display for DescribeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format(&DescribeFormatOptions::default()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct CandidateName {
    /// Sorts annotated tags first
    lightweight: bool,
    name: String,
}

/// Describe `commit_id` relative to the references in `refs`
///
/// # Errors
///
/// `ReferenceNotFound` when no reference can name the commit and
/// `show_commit_oid_as_fallback` is off.
pub fn describe(refs: &Refs, commit_id: ObjectId, options: &DescribeOptions) -> Result<DescribeResult> {
    let names = candidate_names(refs, options)?;

    if let Some(exact) = names.get(&commit_id).and_then(|names| names.first()) {
        return Ok(DescribeResult {
            name: Some(exact.name.clone()),
            depth: 0,
            commit_id,
        });
    }

    let mut candidates = Vec::new();
    if options.max_candidates > 0 {
        let mut walk = RevWalk::new(refs);
        walk.push(&commit_id)?;

        for commit in walk {
            let commit = commit?;
            if let Some(name) = names.get(&commit.id()).and_then(|names| names.first()) {
                candidates.push((commit.id(), name.name.clone()));
                if candidates.len() >= options.max_candidates {
                    break;
                }
            }
        }
    }

    let mut best: Option<(usize, String)> = None;
    for (candidate_id, name) in candidates {
        let depth = depth_from(refs, commit_id, candidate_id)?;
        tracing::trace!(%name, depth, "describe candidate");

        if best.as_ref().is_none_or(|(best_depth, _)| depth < *best_depth) {
            best = Some((depth, name));
        }
    }

    match best {
        Some((depth, name)) => {
            tracing::debug!(%commit_id, %name, depth, "described commit");
            Ok(DescribeResult {
                name: Some(name),
                depth,
                commit_id,
            })
        }
        None if options.show_commit_oid_as_fallback => Ok(DescribeResult {
            name: None,
            depth: 0,
            commit_id,
        }),
        None => Err(Error::ReferenceNotFound(format!(
            "no names found to describe {commit_id}"
        ))),
    }
}

/// Commits reachable from `commit_id` and not from `candidate_id`
fn depth_from(refs: &Refs, commit_id: ObjectId, candidate_id: ObjectId) -> Result<usize> {
    let mut walk = RevWalk::new(refs);
    walk.push(&commit_id)?;
    walk.hide(&candidate_id)?;

    walk.try_fold(0, |depth, commit| commit.map(|_| depth + 1))
}

/// Candidate names grouped by the commit they end up naming
fn candidate_names(
    refs: &Refs,
    options: &DescribeOptions,
) -> Result<HashMap<ObjectId, Vec<CandidateName>>> {
    let database = refs.database();
    let mut names: HashMap<ObjectId, Vec<CandidateName>> = HashMap::new();

    for ref_name in refs.list_all()? {
        if ref_name.is_pseudo() {
            continue;
        }
        if options.strategy != DescribeStrategy::All && !ref_name.is_tag() {
            continue;
        }

        let display = match options.strategy {
            DescribeStrategy::All => ref_name
                .as_str()
                .strip_prefix(REFS_PREFIX)
                .unwrap_or(ref_name.as_str()),
            DescribeStrategy::Default | DescribeStrategy::Tags => ref_name.shorthand(),
        };
        if let Some(pattern) = &options.pattern
            && !display.starts_with(pattern.as_str())
        {
            continue;
        }

        let Ok(target_id) = refs.resolve_name(ref_name.as_str()) else {
            continue;
        };
        let object = database.lookup(&target_id, KindFilter::Any)?;
        let annotated = matches!(object, Object::Tag(_));
        if options.strategy == DescribeStrategy::Default && !annotated {
            continue;
        }

        let Ok(commit) = object.peel(database, ObjectType::Commit) else {
            continue;
        };
        names.entry(commit.id()).or_default().push(CandidateName {
            lightweight: !annotated,
            name: display.to_string(),
        });
    }

    for candidates in names.values_mut() {
        candidates.sort();
    }

    Ok(names)
}
