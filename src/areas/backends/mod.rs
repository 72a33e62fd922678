//! Storage backends for objects and references
//!
//! - `memory`: maps behind `RwLock`s, for graphs assembled in code
//! - `loose`: an existing `.git`-style directory of loose objects and ref files

pub mod loose;
pub mod memory;
