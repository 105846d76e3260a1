//! Media identifiers and link extraction.
//!
//! A [`MediaId`] is the only piece of user-supplied text that ever reaches the
//! fetch tool's command line, so it is restricted to a small alphabet that is
//! safe to pass as a single argument.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Link shapes that carry a video id.
const LINK_PATTERN: &str = r"(?:https?://)?(?:www\.|m\.)?(?:youtube\.com/(?:watch\?(?:[^\s#]*&)?v=|shorts/)|youtu\.be/)([0-9A-Za-z_-]+)";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid media identifier: {0:?}")]
pub struct InvalidMediaId(pub String);

/// Identifier of one media asset, validated against the safe alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MediaId(String);

impl MediaId {
    /// Whether `c` may appear in an identifier.
    pub fn is_safe_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '-' || c == '_'
    }

    pub fn parse(raw: &str) -> Result<Self, InvalidMediaId> {
        if raw.is_empty() || !raw.chars().all(Self::is_safe_char) {
            return Err(InvalidMediaId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MediaId {
    type Error = InvalidMediaId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MediaId> for String {
    fn from(id: MediaId) -> Self {
        id.0
    }
}

/// Finds the first video link in `text` and returns its identifier.
pub fn extract_media_id(text: &str) -> Option<MediaId> {
    let re = Regex::new(LINK_PATTERN).ok()?;
    let caps = re.captures(text)?;
    MediaId::parse(caps.get(1)?.as_str()).ok()
}
