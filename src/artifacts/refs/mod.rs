//! Reference names and targets
//!
//! - `ref_name`: validated reference names and their conventional namespaces
//! - `ref_target`: what a reference points at, an object ID or another name
//! - `revision`: revision expressions such as `main~2` or `HEAD^`

use crate::errors::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

pub mod ref_name;
pub mod ref_target;
pub mod revision;

/// A pattern compiled on first use
pub type LazyRegex = LazyLock<std::result::Result<Regex, regex::Error>>;

/// Characters and sequences git refuses in reference names
pub static INVALID_REF_NAME_REGEX: LazyRegex = LazyLock::new(|| {
    Regex::new(r"^\.|\/\.|\.\.|^\/|\/$|\/\/|\.lock$|\.lock\/|@\{|\.$|[\x00-\x20\*:\?\[\\~\^\x7f]")
});

/// Top-level names such as `HEAD`, `ORIG_HEAD` or `FETCH_HEAD`
pub static PSEUDO_REF_REGEX: LazyRegex = LazyLock::new(|| Regex::new(r"^[A-Z][A-Z_]*$"));

/// Parses the `ref: <name>` form of a symbolic reference file
pub static SYMREF_REGEX: LazyRegex = LazyLock::new(|| Regex::new(r"^ref: (.+)$"));

pub static PARENT_REGEX: LazyRegex = LazyLock::new(|| Regex::new(r"^(.+)\^$"));
pub static ANCESTOR_REGEX: LazyRegex = LazyLock::new(|| Regex::new(r"^(.+)~(\d+)$"));

/// The compiled form of `regex`, or the error compiling it gave
pub fn compiled(regex: &'static LazyRegex) -> Result<&'static Regex> {
    regex.as_ref().map_err(|err| Error::Pattern(err.clone()))
}

pub const HEAD_REF_NAME: &str = "HEAD";
pub const REFS_PREFIX: &str = "refs/";
pub const HEADS_PREFIX: &str = "refs/heads/";
pub const TAGS_PREFIX: &str = "refs/tags/";
pub const REMOTES_PREFIX: &str = "refs/remotes/";

pub const REF_ALIASES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "@" => "HEAD",
};
