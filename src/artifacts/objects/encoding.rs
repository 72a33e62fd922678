//! Commit message encodings
//!
//! A commit may carry an `encoding` header naming the character set of its
//! message. Without the header the message is UTF-8.

use crate::errors::{Error, Result};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Latin1,
}

/// Accepted labels, compared after lower-casing
static ENCODING_LABELS: phf::Map<&'static str, TextEncoding> = phf::phf_map! {
    "utf-8" => TextEncoding::Utf8,
    "utf8" => TextEncoding::Utf8,
    "iso-8859-1" => TextEncoding::Latin1,
    "iso8859-1" => TextEncoding::Latin1,
    "latin1" => TextEncoding::Latin1,
    "latin-1" => TextEncoding::Latin1,
};

impl TextEncoding {
    pub fn for_label(label: &str) -> Result<Self> {
        ENCODING_LABELS
            .get(label.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| Error::UnsupportedEncoding(label.to_string()))
    }

    /// Encoding named by an optional header, UTF-8 when absent
    pub fn for_header(label: Option<&str>) -> Result<Self> {
        label.map_or(Ok(TextEncoding::Utf8), Self::for_label)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Latin1 => "ISO-8859-1",
        }
    }

    pub fn decode<'b>(&self, bytes: &'b [u8]) -> Result<Cow<'b, str>> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|_| Error::InvalidEncoding(self.name().to_string())),
            // every byte maps to the code point of the same value
            TextEncoding::Latin1 => Ok(Cow::Owned(bytes.iter().map(|&b| b as char).collect())),
        }
    }

    pub fn encode<'t>(&self, text: &'t str) -> Result<Cow<'t, [u8]>> {
        match self {
            TextEncoding::Utf8 => Ok(Cow::Borrowed(text.as_bytes())),
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).ok())
                .collect::<Option<Vec<u8>>>()
                .map(Cow::Owned)
                .ok_or_else(|| Error::InvalidEncoding(self.name().to_string())),
        }
    }
}
