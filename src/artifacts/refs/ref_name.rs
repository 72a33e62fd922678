use crate::artifacts::refs::{
    HEADS_PREFIX, INVALID_REF_NAME_REGEX, PSEUDO_REF_REGEX, REFS_PREFIX, REMOTES_PREFIX,
    TAGS_PREFIX, compiled,
};
use crate::errors::{Error, Result};
use std::borrow::Borrow;

/// A validated reference name
///
/// Either a top-level pseudo reference (`HEAD`, `ORIG_HEAD`) or a name under
/// `refs/` that passes git's ref-name rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefName(String);

impl RefName {
    pub fn try_parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidReferenceName(name));
        }

        if compiled(&PSEUDO_REF_REGEX)?.is_match(&name) {
            return Ok(Self(name));
        }

        if !name.starts_with(REFS_PREFIX)
            || name.len() == REFS_PREFIX.len()
            || compiled(&INVALID_REF_NAME_REGEX)?.is_match(&name)
        {
            return Err(Error::InvalidReferenceName(name));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name with its well-known namespace stripped (`refs/heads/main` is `main`)
    pub fn shorthand(&self) -> &str {
        [HEADS_PREFIX, TAGS_PREFIX, REMOTES_PREFIX, REFS_PREFIX]
            .iter()
            .find_map(|prefix| self.0.strip_prefix(prefix))
            .unwrap_or(&self.0)
    }

    pub fn is_branch(&self) -> bool {
        self.0.starts_with(HEADS_PREFIX)
    }

    pub fn is_tag(&self) -> bool {
        self.0.starts_with(TAGS_PREFIX)
    }

    pub fn is_remote(&self) -> bool {
        self.0.starts_with(REMOTES_PREFIX)
    }

    /// Whether this is a top-level name such as `HEAD`
    pub fn is_pseudo(&self) -> bool {
        !self.0.starts_with(REFS_PREFIX)
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RefName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for RefName {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::try_parse(value)
    }
}
