//! Object, reference and revision-walk core for a git-style content-addressed store
//!
//! A [`Repository`] pairs an object store with a reference store. Both are
//! traits ([`ObjectStore`], [`RefBackend`]) with in-memory and loose-file
//! implementations under [`areas::backends`].
//!
//! ```no_run
//! use bit_repo::{Repository, SortMode};
//!
//! # fn main() -> bit_repo::Result<()> {
//! let repository = Repository::open_loose(".git")?;
//! let head = repository.head()?.target_id()?;
//!
//! let mut walk = repository.walk(Some(&head), SortMode::TOPOLOGICAL)?;
//! while let Some(commit) = walk.next_step()?.into_commit() {
//!     println!("{} {}", commit.id().short(), commit.summary()?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod areas;
pub mod artifacts;
pub mod errors;

pub use areas::database::{Database, ObjectStore, RawObject};
pub use areas::refs::{RefBackend, Reference, ReferenceNames, ReferenceState, Refs};
pub use areas::repository::Repository;
pub use artifacts::log::describe::{
    DescribeFormatOptions, DescribeOptions, DescribeResult, DescribeStrategy,
};
pub use artifacts::log::rev_walk::{RevWalk, SortMode, WalkStep};
pub use artifacts::objects::blob::Blob;
pub use artifacts::objects::commit::Commit;
pub use artifacts::objects::object::Object;
pub use artifacts::objects::object_id::{ObjectId, ShortId};
pub use artifacts::objects::object_type::{KindFilter, ObjectType};
pub use artifacts::objects::signature::Signature;
pub use artifacts::objects::tag::Tag;
pub use artifacts::objects::tree::{EntryMode, Tree, TreeEntry};
pub use artifacts::refs::ref_name::RefName;
pub use artifacts::refs::ref_target::RefTarget;
pub use errors::{Error, Result};
