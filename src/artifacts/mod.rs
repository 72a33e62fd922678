//! Git data structures and algorithms
//!
//! - `log`: revision walking and `describe`
//! - `objects`: object IDs, the four object kinds and signatures
//! - `refs`: reference names, targets and revision expressions

pub mod log;
pub mod objects;
pub mod refs;
