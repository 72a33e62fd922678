//! Loose-file backends for an existing `.git` directory
//!
//! ## Objects
//!
//! Each object lives in `<objects>/<first-2-hex>/<remaining-38-hex>`, holding
//! the zlib-deflated bytes of `"<kind> <len>\0" + payload`. Pack files are not
//! read.
//!
//! ## References
//!
//! Each reference is a text file named after the reference (`HEAD`,
//! `refs/heads/main`, ...) containing either 40 hex digits or `ref: <name>`.
//! `packed-refs` is not read.

use crate::areas::database::{ObjectStore, RawObject};
use crate::areas::refs::RefBackend;
use crate::artifacts::objects::object_id::{ObjectId, ShortId};
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::refs::ref_name::RefName;
use crate::artifacts::refs::ref_target::RefTarget;
use crate::artifacts::refs::{HEAD_REF_NAME, SYMREF_REGEX, compiled};
use crate::errors::{Error, Result};
use bytes::Bytes;
use derive_new::new;
use fake::rand;
use file_guard::Lock;
use std::io::{ErrorKind, Read, Write};
use std::ops::DerefMut;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, new)]
pub struct LooseObjectStore {
    /// Path to the objects directory (typically `.git/objects`)
    path: Box<Path>,
}

impl LooseObjectStore {
    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    fn compress(data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data)?;

        Ok(encoder.finish()?)
    }

    fn decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut decoder = flate2::read::ZlibDecoder::new(data);
        let mut decompressed_content = Vec::new();
        decoder.read_to_end(&mut decompressed_content)?;

        Ok(decompressed_content)
    }

    /// Split `"<kind> <len>\0" + payload`, checking the declared length
    fn split_header(oid: &ObjectId, content: Vec<u8>) -> Result<RawObject> {
        let nul = content
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::corrupt(oid, "missing object header"))?;
        let header = std::str::from_utf8(&content[..nul])
            .map_err(|_| Error::corrupt(oid, "non-ascii object header"))?;
        let (kind, size) = header
            .split_once(' ')
            .ok_or_else(|| Error::corrupt(oid, format!("malformed object header {header:?}")))?;
        let size: usize = size
            .parse()
            .map_err(|_| Error::corrupt(oid, format!("invalid object size {size:?}")))?;

        let payload_len = content.len() - nul - 1;
        if size != payload_len {
            return Err(Error::corrupt(
                oid,
                format!("header declares {size} bytes, payload has {payload_len}"),
            ));
        }

        let kind = kind.to_string();
        let data = Bytes::from(content).slice(nul + 1..);
        Ok(RawObject { kind, data })
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }

    /// IDs stored in one fan-out directory whose hex form starts with `prefix`
    fn scan_fanout_dir(&self, dir_name: &str, prefix: &ShortId) -> Result<Vec<ObjectId>> {
        let dir_path = self.path.join(dir_name);
        if !dir_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for entry in std::fs::read_dir(&dir_path)? {
            let file_name = entry?.file_name();
            let full_oid = format!("{dir_name}{}", file_name.to_string_lossy());

            if let Ok(oid) = ObjectId::try_parse(&full_oid)
                && prefix.matches(&oid)
            {
                matches.push(oid);
            }
        }

        Ok(matches)
    }
}

impl ObjectStore for LooseObjectStore {
    fn read(&self, oid: &ObjectId) -> Result<Option<RawObject>> {
        let object_path = self.path.join(oid.to_path());
        let compressed = match std::fs::read(&object_path) {
            Ok(compressed) => compressed,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let content = Self::decompress(&compressed)
            .map_err(|err| Error::corrupt(oid, format!("cannot inflate object: {err}")))?;

        Self::split_header(oid, content).map(Some)
    }

    fn find_by_prefix(&self, prefix: &ShortId) -> Result<Vec<ObjectId>> {
        let hex = prefix.hex();

        // with 2+ characters only one fan-out directory can match
        if hex.len() >= 2 {
            return self.scan_fanout_dir(&hex[..2], prefix);
        }

        let mut matches = Vec::new();
        for i in 0..=255u8 {
            matches.extend(self.scan_fanout_dir(&format!("{i:02x}"), prefix)?);
        }

        Ok(matches)
    }

    fn write(&self, object_type: ObjectType, data: Bytes) -> Result<ObjectId> {
        let oid = ObjectId::hash_object(object_type, &data);
        let object_path = self.path.join(oid.to_path());

        if object_path.exists() {
            return Ok(oid);
        }

        let object_dir = object_path
            .parent()
            .ok_or_else(|| Error::corrupt(oid, "invalid object path"))?;
        std::fs::create_dir_all(object_dir)?;

        let mut content = format!("{object_type} {}\0", data.len()).into_bytes();
        content.extend_from_slice(&data);
        let compressed = Self::compress(&content)?;

        let temp_object_path = object_dir.join(Self::generate_temp_name());
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_object_path)?;
        file.write_all(&compressed)?;

        // rename the temp file into place so readers never see a partial object
        std::fs::rename(&temp_object_path, &object_path)?;

        Ok(oid)
    }

    fn contains(&self, oid: &ObjectId) -> Result<bool> {
        Ok(self.path.join(oid.to_path()).is_file())
    }
}

/// Loose reference files
#[derive(Debug, new)]
pub struct LooseRefBackend {
    /// Path to the git directory (typically `.git`)
    path: Box<Path>,
}

impl LooseRefBackend {
    fn ref_path(&self, name: &RefName) -> PathBuf {
        self.path.join(name.as_str())
    }

    pub fn refs_path(&self) -> PathBuf {
        self.path.join("refs")
    }

    fn parse_ref_file(name: &RefName, content: &str) -> Result<Option<RefTarget>> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }

        let symref_match = compiled(&SYMREF_REGEX)?.captures(content);
        if let Some(symref_match) = symref_match {
            let target = RefName::try_parse(&symref_match[1])
                .map_err(|_| Error::corrupt(name, format!("invalid symbolic target {content:?}")))?;
            Ok(Some(RefTarget::Symbolic(target)))
        } else {
            let oid = ObjectId::try_parse(content)
                .map_err(|_| Error::corrupt(name, format!("invalid reference content {content:?}")))?;
            Ok(Some(RefTarget::Direct(oid)))
        }
    }

    fn prune_empty_parent_dirs(&self, path: &Path) -> Result<()> {
        let refs_path = self.refs_path();

        if let Some(parent) = path.parent()
            && parent.starts_with(&refs_path)
            && parent != refs_path
            && parent.read_dir()?.next().is_none()
        {
            std::fs::remove_dir(parent)?;
            self.prune_empty_parent_dirs(parent)?;
        }

        Ok(())
    }
}

impl RefBackend for LooseRefBackend {
    fn read(&self, name: &RefName) -> Result<Option<RefTarget>> {
        let ref_path = self.ref_path(name);
        if !ref_path.is_file() {
            return Ok(None);
        }

        Self::parse_ref_file(name, &std::fs::read_to_string(&ref_path)?)
    }

    fn write(&self, name: &RefName, target: &RefTarget) -> Result<()> {
        let ref_path = self.ref_path(name);
        if let Some(parent) = ref_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let raw_ref = match target {
            RefTarget::Direct(oid) => format!("{oid}\n"),
            RefTarget::Symbolic(target) => format!("ref: {target}\n"),
        };

        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&ref_path)?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;
        lock.deref_mut().write_all(raw_ref.as_bytes())?;

        Ok(())
    }

    fn remove(&self, name: &RefName) -> Result<bool> {
        let ref_path = self.ref_path(name);
        if !ref_path.is_file() {
            return Ok(false);
        }

        std::fs::remove_file(&ref_path)?;
        self.prune_empty_parent_dirs(&ref_path)?;

        Ok(true)
    }

    fn names(&self) -> Result<Vec<RefName>> {
        let mut names = WalkDir::new(self.refs_path())
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let relative_path = entry.path().strip_prefix(&self.path).ok()?;
                let name = relative_path
                    .components()
                    .map(|component| component.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                RefName::try_parse(name).ok()
            })
            .collect::<Vec<_>>();

        if self.path.join(HEAD_REF_NAME).is_file() {
            names.push(RefName::try_parse(HEAD_REF_NAME)?);
        }

        names.sort();
        Ok(names)
    }
}
