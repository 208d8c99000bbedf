//! Resolved post metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of media a post carries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
    Album,
}

impl MediaKind {
    /// Map the numeric media type used by the media API.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Photo),
            2 => Some(Self::Video),
            8 => Some(Self::Album),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Album => "album",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for one post as returned by a resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaPost {
    pub kind: MediaKind,

    pub title: Option<String>,

    /// Caption text
    pub description: Option<String>,

    /// Primary photo (thumbnail) locator
    pub photo: Option<String>,

    /// Primary video locator
    pub video: Option<String>,

    /// Secondary resource locators, one per album item
    pub resources: Vec<String>,

    /// Owning account's user name
    pub account_name: String,
}
