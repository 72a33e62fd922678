//! Git object types and operations
//!
//! Git stores all content as objects identified by SHA-1 hashes. There are four kinds:
//!
//! - **Blob**: File content (raw bytes)
//! - **Tree**: Directory listing (names, modes, and object IDs)
//! - **Commit**: Snapshot with metadata (author, message, parent commits, tree)
//! - **Tag**: Annotated, signed-off pointer to another object
//!
//! Each kind can be decoded from and encoded to its payload, the part of the
//! git object format that follows the `<type> <size>\0` header.

pub mod blob;
pub mod commit;
pub mod encoding;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod signature;
pub mod tag;
pub mod tree;

/// Length of a raw object ID in bytes
pub const ID_SIZE: usize = 20;

/// Length of an object ID in hexadecimal format
pub const HEX_SIZE: usize = ID_SIZE * 2;

/// Shortest prefix accepted when looking objects up by abbreviated ID
pub const MIN_PREFIX_LEN: usize = 4;

/// Length of the abbreviated form used for display
pub const SHORT_ID_LENGTH: usize = 7;
