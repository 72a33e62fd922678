//! Git annotated tag object
//!
//! ## Format
//!
//! Payload:
//! ```text
//! object <target-sha>
//! type <target-kind>
//! tag <name>
//! tagger <name> <email> <timestamp> <timezone>
//!
//! <tag message>
//! ```
//!
//! The tagger line is optional; very old tags were written without one.

use crate::areas::database::Database;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::{KindFilter, ObjectType};
use crate::artifacts::objects::signature::Signature;
use crate::errors::{Error, Result};
use bytes::Bytes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    oid: ObjectId,
    data: Bytes,
    target_oid: ObjectId,
    target_kind: ObjectType,
    name: String,
    tagger: Option<Signature>,
    message: String,
}

impl Tag {
    pub fn new(
        target_oid: ObjectId,
        target_kind: ObjectType,
        name: &str,
        tagger: Option<Signature>,
        message: &str,
    ) -> Result<Self> {
        if name.is_empty() || name.contains(['\n', '\0']) {
            return Err(Error::InvalidReferenceName(name.to_string()));
        }

        let mut payload = format!("object {target_oid}\ntype {target_kind}\ntag {name}\n");
        if let Some(tagger) = &tagger {
            payload.push_str(&format!("tagger {tagger}\n"));
        }
        payload.push('\n');
        payload.push_str(message);

        let data = Bytes::from(payload);
        Ok(Tag {
            oid: ObjectId::hash_object(ObjectType::Tag, &data),
            data,
            target_oid,
            target_kind,
            name: name.to_string(),
            tagger,
            message: message.to_string(),
        })
    }

    pub fn id(&self) -> ObjectId {
        self.oid
    }

    pub fn target_id(&self) -> ObjectId {
        self.target_oid
    }

    /// Kind declared by the `type` header
    pub fn target_kind(&self) -> ObjectType {
        self.target_kind
    }

    /// Load the tagged object, checking it has the declared kind
    pub fn target(&self, database: &Database) -> Result<Object> {
        database.lookup(&self.target_oid, KindFilter::Only(self.target_kind))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tagger(&self) -> Option<&Signature> {
        self.tagger.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Packable for Tag {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tag
    }

    fn serialize(&self) -> Bytes {
        self.data.clone()
    }

    fn object_id(&self) -> ObjectId {
        self.oid
    }
}

impl Unpackable for Tag {
    fn deserialize(oid: ObjectId, data: Bytes) -> Result<Self> {
        let text = String::from_utf8_lossy(&data).into_owned();
        let (headers, message) = text.split_once("\n\n").unwrap_or((text.as_str(), ""));

        let mut target_oid = None;
        let mut target_kind = None;
        let mut name = None;
        let mut tagger = None;

        for line in headers.lines() {
            let Some((key, value)) = line.split_once(' ') else {
                continue;
            };
            match key {
                "object" => {
                    let parsed = ObjectId::try_parse(value)
                        .map_err(|_| Error::corrupt(oid, "invalid object line"))?;
                    target_oid = Some(parsed);
                }
                "type" => target_kind = Some(ObjectType::try_from(value)?),
                "tag" => name = Some(value.to_string()),
                "tagger" => {
                    let parsed = Signature::parse(value)
                        .map_err(|_| Error::corrupt(oid, "invalid tagger line"))?;
                    tagger = Some(parsed);
                }
                _ => {}
            }
        }

        Ok(Tag {
            oid,
            target_oid: target_oid.ok_or_else(|| Error::corrupt(oid, "missing object line"))?,
            target_kind: target_kind.ok_or_else(|| Error::corrupt(oid, "missing type line"))?,
            name: name.ok_or_else(|| Error::corrupt(oid, "missing tag line"))?,
            tagger,
            message: message.to_string(),
            data,
        })
    }
}
