//! Git tree object
//!
//! Trees represent directory snapshots in Git. They contain entries for files (blobs),
//! subdirectories (other trees), symlinks and submodule commits, along with their
//! names and modes.
//!
//! ## Format
//!
//! Payload: a sequence of entries `<mode> <name>\0<20-byte-sha1>`, with the mode
//! written in octal without leading zeros.

use crate::areas::database::Database;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::{KindFilter, ObjectType};
use crate::artifacts::objects::ID_SIZE;
use crate::errors::{Error, Result};
use bytes::Bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryMode {
    Regular,
    Executable,
    Symlink,
    Directory,
    Submodule,
}

impl EntryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryMode::Regular => "100644",
            EntryMode::Executable => "100755",
            EntryMode::Symlink => "120000",
            EntryMode::Directory => "40000",
            EntryMode::Submodule => "160000",
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            EntryMode::Regular => 0o100644,
            EntryMode::Executable => 0o100755,
            EntryMode::Symlink => 0o120000,
            EntryMode::Directory => 0o40000,
            EntryMode::Submodule => 0o160000,
        }
    }

    /// Kind of object the entry points at
    pub fn object_type(&self) -> ObjectType {
        match self {
            EntryMode::Regular | EntryMode::Executable | EntryMode::Symlink => ObjectType::Blob,
            EntryMode::Directory => ObjectType::Tree,
            EntryMode::Submodule => ObjectType::Commit,
        }
    }
}

impl TryFrom<&str> for EntryMode {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "100644" | "100664" => Ok(EntryMode::Regular),
            "100755" => Ok(EntryMode::Executable),
            "120000" => Ok(EntryMode::Symlink),
            "40000" | "040000" => Ok(EntryMode::Directory),
            "160000" => Ok(EntryMode::Submodule),
            _ => Err(Error::corrupt("tree", format!("invalid entry mode {value}"))),
        }
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.as_u32())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    pub mode: EntryMode,
    pub oid: ObjectId,
}

impl TreeEntry {
    pub fn new(name: impl Into<String>, mode: EntryMode, oid: ObjectId) -> Self {
        TreeEntry {
            name: name.into(),
            mode,
            oid,
        }
    }

    pub fn kind(&self) -> ObjectType {
        self.mode.object_type()
    }

    /// Load the object this entry points at
    pub fn to_object(&self, database: &Database) -> Result<Object> {
        database.lookup(&self.oid, KindFilter::Only(self.kind()))
    }
}

/// Git tree object representing a directory snapshot
///
/// Entries keep the order they were stored in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    oid: ObjectId,
    data: Bytes,
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Build a tree from entries, sorted the way git sorts them
    ///
    /// Directories compare as if their name ended with `/`.
    pub fn new(mut entries: Vec<TreeEntry>) -> Result<Self> {
        entries.sort_by(|a, b| Self::sort_key(a).cmp(&Self::sort_key(b)));

        let mut payload = Vec::new();
        for entry in &entries {
            if entry.name.is_empty() || entry.name.contains(['/', '\0']) {
                return Err(Error::corrupt("tree", format!("invalid entry name {:?}", entry.name)));
            }
            payload.extend_from_slice(format!("{:o} {}", entry.mode.as_u32(), entry.name).as_bytes());
            payload.push(0);
            payload.extend_from_slice(entry.oid.as_bytes());
        }

        let data = Bytes::from(payload);
        Ok(Tree {
            oid: ObjectId::hash_object(ObjectType::Tree, &data),
            data,
            entries,
        })
    }

    fn sort_key(entry: &TreeEntry) -> Vec<u8> {
        let mut key = entry.name.as_bytes().to_vec();
        if entry.mode == EntryMode::Directory {
            key.push(b'/');
        }
        key
    }

    pub fn id(&self) -> ObjectId {
        self.oid
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter()
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Walk a `/`-separated path through nested trees
    pub fn get_path(&self, database: &Database, path: &str) -> Result<TreeEntry> {
        let not_found = || Error::PathNotFound(path.to_string());
        let mut components = path.split('/').filter(|c| !c.is_empty()).peekable();
        let mut tree = self.clone();

        while let Some(component) = components.next() {
            let entry = tree.get(component).cloned().ok_or_else(not_found)?;
            if components.peek().is_none() {
                return Ok(entry);
            }
            tree = database
                .lookup(&entry.oid, KindFilter::Only(ObjectType::Tree))?
                .into_tree()?;
        }

        Err(not_found())
    }
}

impl Packable for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn serialize(&self) -> Bytes {
        self.data.clone()
    }

    fn object_id(&self) -> ObjectId {
        self.oid
    }
}

impl Unpackable for Tree {
    fn deserialize(oid: ObjectId, data: Bytes) -> Result<Self> {
        let mut entries = Vec::new();
        let mut rest = &data[..];

        while !rest.is_empty() {
            let space = rest
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| Error::corrupt(oid, "unexpected EOF in mode"))?;
            let mode = std::str::from_utf8(&rest[..space])
                .map_err(|_| Error::corrupt(oid, "non-ascii entry mode"))?;
            let mode = EntryMode::try_from(mode)?;
            rest = &rest[space + 1..];

            let nul = rest
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| Error::corrupt(oid, "unexpected EOF in name"))?;
            let name = String::from_utf8_lossy(&rest[..nul]).into_owned();
            rest = &rest[nul + 1..];

            if rest.len() < ID_SIZE {
                return Err(Error::corrupt(oid, "unexpected EOF in object id"));
            }
            let entry_oid = ObjectId::from_raw(&rest[..ID_SIZE])?;
            rest = &rest[ID_SIZE..];

            entries.push(TreeEntry::new(name, mode, entry_oid));
        }

        Ok(Tree { oid, data, entries })
    }
}
