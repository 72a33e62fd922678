//! Storage-facing components
//!
//! - `backends`: in-memory and loose-file implementations of the storage traits
//! - `database`: object lookup, prefix expansion and writes over an [`ObjectStore`](database::ObjectStore)
//! - `refs`: reference handles over a [`RefBackend`](refs::RefBackend)
//! - `repository`: one object store plus one reference store

pub mod backends;
pub mod database;
pub mod refs;
pub mod repository;
