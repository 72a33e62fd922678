//! Author, committer and tagger identities
//!
//! A signature is the `Name <email> timestamp timezone` line found in commit
//! and tag headers. Signatures built by the caller are owned values;
//! the ones returned by [`Commit::author`](crate::artifacts::objects::commit::Commit::author)
//! and friends are borrowed from their object and cannot outlive it.

use crate::errors::{Error, Result};
use chrono::{DateTime, FixedOffset, Offset, TimeZone};

/// Identity plus the moment it acted
///
/// `offset` is the timezone offset from UTC in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    name: String,
    email: String,
    time: i64,
    offset: i32,
}

/// Longest timezone offset git accepts, in minutes
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

impl Signature {
    /// Create a signature at a specific time
    ///
    /// # Arguments
    ///
    /// * `name` - Identity name
    /// * `email` - Identity email address
    /// * `time` - Seconds since the Unix epoch
    /// * `offset` - Timezone offset in minutes
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        time: i64,
        offset: i32,
    ) -> Result<Self> {
        let name = name.into();
        let email = email.into();

        for field in [&name, &email] {
            if field.contains(['<', '>', '\n', '\0']) {
                return Err(Error::InvalidSignature(field.clone()));
            }
        }
        if name.trim().is_empty() {
            return Err(Error::InvalidSignature("empty name".to_string()));
        }
        if offset.abs() > MAX_OFFSET_MINUTES {
            return Err(Error::InvalidSignature(format!("offset {offset} out of range")));
        }

        Ok(Signature {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            time,
            offset,
        })
    }

    /// Create a signature with the current local time
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Result<Self> {
        let now = chrono::Local::now();
        let offset = now.offset().fix().local_minus_utc() / 60;
        Self::new(name, email, now.timestamp(), offset)
    }

    /// Create a signature at the given moment
    pub fn at(
        name: impl Into<String>,
        email: impl Into<String>,
        when: DateTime<FixedOffset>,
    ) -> Result<Self> {
        let offset = when.offset().local_minus_utc() / 60;
        Self::new(name, email, when.timestamp(), offset)
    }

    /// Load the author identity from environment variables
    ///
    /// Reads GIT_AUTHOR_NAME, GIT_AUTHOR_EMAIL, and optionally GIT_AUTHOR_DATE.
    /// If no date is provided, uses current time.
    pub fn from_env() -> Result<Self> {
        Self::load_from_env("GIT_AUTHOR_NAME", "GIT_AUTHOR_EMAIL", "GIT_AUTHOR_DATE")
    }

    /// Load the committer identity, falling back to the author variables
    pub fn committer_from_env() -> Result<Self> {
        match Self::load_from_env(
            "GIT_COMMITTER_NAME",
            "GIT_COMMITTER_EMAIL",
            "GIT_COMMITTER_DATE",
        ) {
            Err(Error::MissingIdentity(_)) => Self::from_env(),
            other => other,
        }
    }

    fn load_from_env(
        name_var: &'static str,
        email_var: &'static str,
        date_var: &'static str,
    ) -> Result<Self> {
        let name = std::env::var(name_var).map_err(|_| Error::MissingIdentity(name_var))?;
        let email = std::env::var(email_var).map_err(|_| Error::MissingIdentity(email_var))?;
        let timestamp = std::env::var(date_var).ok().and_then(|date_str| {
            DateTime::parse_from_rfc2822(&date_str)
                .or_else(|_| DateTime::parse_from_str(&date_str, "%Y-%m-%d %H:%M:%S %z"))
                .ok()
        });

        match timestamp {
            Some(ts) => Self::at(name, email, ts),
            None => Self::now(name, email),
        }
    }

    /// Parse the `Name <email> timestamp timezone` form used in object headers
    pub fn parse(line: &str) -> Result<Self> {
        let invalid = || Error::InvalidSignature(line.to_string());

        let email_end = line.rfind('>').ok_or_else(invalid)?;
        let email_start = line[..email_end].rfind('<').ok_or_else(invalid)?;

        let name = line[..email_start].trim();
        let email = &line[email_start + 1..email_end];

        let mut when = line[email_end + 1..].split_whitespace();
        let time = when
            .next()
            .and_then(|t| t.parse::<i64>().ok())
            .ok_or_else(invalid)?;
        let offset = when.next().map_or(Some(0), parse_offset).ok_or_else(invalid)?;

        Ok(Signature {
            name: name.to_string(),
            email: email.to_string(),
            time,
            offset,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Seconds since the Unix epoch
    pub fn time(&self) -> i64 {
        self.time
    }

    /// Timezone offset in minutes
    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// The timestamp in the signature's own timezone
    pub fn when(&self) -> DateTime<FixedOffset> {
        let zone = FixedOffset::east_opt(self.offset * 60).unwrap_or(chrono::Utc.fix());
        zone.timestamp_opt(self.time, 0)
            .single()
            .unwrap_or_else(|| DateTime::<chrono::Utc>::UNIX_EPOCH.fixed_offset())
    }

    /// Format author name and email for display
    ///
    /// # Returns
    ///
    /// String in format "Name <email@example.com>"
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// Format timestamp in human-readable form
    ///
    /// # Returns
    ///
    /// String like "Mon Jan 1 12:34:56 2024 +0000"
    pub fn readable_timestamp(&self) -> String {
        self.when().format("%a %b %-d %H:%M:%S %Y %z").to_string()
    }
}

fn parse_offset(text: &str) -> Option<i32> {
    let (sign, digits) = match text.split_at_checked(1)? {
        ("+", digits) => (1, digits),
        ("-", digits) => (-1, digits),
        _ => return None,
    };
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    Some(sign * (hours * 60 + minutes))
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.offset < 0 { '-' } else { '+' };
        let offset = self.offset.abs();
        write!(
            f,
            "{} <{}> {} {}{:02}{:02}",
            self.name,
            self.email,
            self.time,
            sign,
            offset / 60,
            offset % 60
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::Fake;
    use fake::faker::internet::en::FreeEmail;
    use fake::faker::name::en::Name;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_display_and_parse_agree() {
        let name = Name().fake::<String>();
        let email = FreeEmail().fake::<String>();
        let signature = Signature::new(name, email, 1_700_000_000, -330).unwrap();

        let line = signature.to_string();
        assert!(line.ends_with(" 1700000000 -0530"));
        assert_eq!(Signature::parse(&line).unwrap(), signature);
    }

    #[rstest]
    #[case("A <a@example.com> 0 +0000", 0)]
    #[case("A <a@example.com> 0 +0100", 60)]
    #[case("A <a@example.com> 0 -0745", -465)]
    fn test_parse_offsets(#[case] line: &str, #[case] offset: i32) {
        assert_eq!(Signature::parse(line).unwrap().offset(), offset);
    }

    #[test]
    fn test_parse_keeps_spaces_in_names() {
        let signature = Signature::parse("Ada King Lovelace <ada@example.com> 10 +0000").unwrap();
        assert_eq!(signature.name(), "Ada King Lovelace");
        assert_eq!(signature.email(), "ada@example.com");
        assert_eq!(signature.time(), 10);
    }

    #[rstest]
    #[case("no email 0 +0000")]
    #[case("A <a@example.com> soon +0000")]
    #[case("A <a@example.com> 0 0100")]
    fn test_parse_rejects_malformed_lines(#[case] line: &str) {
        assert!(matches!(
            Signature::parse(line),
            Err(Error::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_new_rejects_angle_brackets() {
        assert!(Signature::new("Eve <evil>", "e@example.com", 0, 0).is_err());
        assert!(Signature::new("Eve", "e@example.com", 0, 24 * 60).is_err());
    }

    #[test]
    fn test_when_uses_signature_timezone() {
        let signature = Signature::new("A", "a@example.com", 0, 120).unwrap();
        assert_eq!(signature.when().to_rfc3339(), "1970-01-01T02:00:00+02:00");
    }
}
