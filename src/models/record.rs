//! Dataset row structure.

use std::fmt;
use std::path::PathBuf;

use crate::models::{MediaKind, MediaPost};

/// Number of secondary resource columns in every row.
pub const RESOURCE_SLOTS: usize = 10;

/// Fixed dataset header, in column order.
pub const COLUMNS: [&str; 9 + RESOURCE_SLOTS] = [
    "url",
    "media_type",
    "media_path",
    "title",
    "description",
    "photo",
    "video",
    "account_name",
    "notes",
    "resource_1",
    "resource_2",
    "resource_3",
    "resource_4",
    "resource_5",
    "resource_6",
    "resource_7",
    "resource_8",
    "resource_9",
    "resource_10",
];

/// Classification stored in the `notes` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    LoginRequired,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::LoginRequired => "LOGIN_REQUIRED",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dataset row. Absent values are written as empty cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRecord {
    pub url: String,
    pub media_type: Option<MediaKind>,
    pub media_path: Option<PathBuf>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub photo: Option<String>,
    pub video: Option<String>,
    pub account_name: Option<String>,
    pub outcome: Outcome,
    pub resources: [Option<String>; RESOURCE_SLOTS],
}

impl DatasetRecord {
    /// Build an `OK` row from a resolved post.
    ///
    /// Resources beyond [`RESOURCE_SLOTS`] are dropped.
    pub fn from_post(url: &str, post: MediaPost) -> Self {
        if post.resources.len() > RESOURCE_SLOTS {
            log::warn!(
                "Post {} has {} resources, keeping the first {}",
                url,
                post.resources.len(),
                RESOURCE_SLOTS
            );
        }

        let mut resources: [Option<String>; RESOURCE_SLOTS] = Default::default();
        for (slot, locator) in resources.iter_mut().zip(post.resources) {
            *slot = non_empty(Some(locator));
        }

        Self {
            url: url.to_string(),
            media_type: Some(post.kind),
            media_path: None,
            title: non_empty(post.title),
            description: non_empty(post.description),
            photo: non_empty(post.photo),
            video: non_empty(post.video),
            account_name: non_empty(Some(post.account_name)),
            outcome: Outcome::Ok,
            resources,
        }
    }

    /// Build the minimal row for a post that requires login.
    pub fn login_required(url: &str) -> Self {
        Self {
            url: url.to_string(),
            media_type: None,
            media_path: None,
            title: None,
            description: None,
            photo: None,
            video: None,
            account_name: None,
            outcome: Outcome::LoginRequired,
            resources: Default::default(),
        }
    }

    /// Present media locators in download order: photo, video, resource 1..10.
    pub fn media_locators(&self) -> Vec<&str> {
        [&self.photo, &self.video]
            .into_iter()
            .chain(self.resources.iter())
            .filter_map(|locator| locator.as_deref())
            .collect()
    }

    /// Cell values in [`COLUMNS`] order.
    pub fn to_row(&self) -> Vec<String> {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();

        let mut row = Vec::with_capacity(COLUMNS.len());
        row.push(self.url.clone());
        row.push(
            self.media_type
                .map(|kind| kind.as_str().to_string())
                .unwrap_or_default(),
        );
        row.push(
            self.media_path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
        );
        row.push(text(&self.title));
        row.push(text(&self.description));
        row.push(text(&self.photo));
        row.push(text(&self.video));
        row.push(text(&self.account_name));
        row.push(self.outcome.as_str().to_string());
        row.extend(self.resources.iter().map(text));
        row
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
