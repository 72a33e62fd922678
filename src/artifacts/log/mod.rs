//! Commit history traversal
//!
//! - `rev_walk`: ordered walk from pushed commits, stopping at hidden ones
//! - `describe`: naming a commit after the nearest reference
//!
//! ## Algorithm
//!
//! The walk keeps a priority queue ordered by commit time. Hiding a commit
//! marks it and its ancestors uninteresting; the walk ends once only
//! uninteresting commits are queued. Topological and reversed orders drain
//! the whole walk first and reorder the result.

pub mod describe;
pub mod rev_walk;
