//! Types produced by the filename classifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Video quality detected from a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Quality {
    #[serde(rename = "720p")]
    Hd720,
    #[serde(rename = "1080p")]
    Hd1080,
    #[serde(rename = "4K")]
    Uhd4k,
    #[default]
    Unknown,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Hd720 => "720p",
            Quality::Hd1080 => "1080p",
            Quality::Uhd4k => "4K",
            Quality::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Movie,
    Series,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Movie => "movie",
            Category::Series => "series",
        }
    }
}

/// How a bare `cap N` token maps to a season.
///
/// Spanish release names number episodes as `Cap.203` (season 2, episode 3)
/// but some uploaders use plain episode numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CapSeasonPolicy {
    /// `N >= 100` is read as season `N / 100`, episode `N % 100`; smaller
    /// numbers are episodes of season 1.
    #[default]
    Hundreds,
    /// Always season 1, `N` is the episode.
    AlwaysOne,
}

/// Metadata derived from a release filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentMetadata {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    pub quality: Quality,
    pub category: Category,
    /// Set for series only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
}
