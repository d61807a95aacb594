use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::{Category, Quality, TorrentMetadata};
use crate::store::StoreError;
use crate::torrent::MagnetRecord;

/// What an entry's `source` points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// `source` is a magnet URI.
    #[default]
    Magnet,
    /// `source` is the URL of an archived .torrent file.
    Torrent,
}

/// One item of the flat catalog.
///
/// `source` identifies the entry. Fields this type does not know about are
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub title: String,
    #[serde(default)]
    pub source: String,
    #[serde(rename = "type", default)]
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<Quality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infohash: Option<String>,
    /// Magnet URI when `source` is a hosted file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// RFC 3339 timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CatalogEntry {
    pub fn new(title: impl Into<String>, source: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            title: title.into(),
            source: source.into(),
            kind,
            category: None,
            year: None,
            season: None,
            episode: None,
            quality: None,
            infohash: None,
            magnet: None,
            size_bytes: None,
            added: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Entry whose source is the magnet URI itself.
    pub fn from_magnet(metadata: &TorrentMetadata, record: &MagnetRecord) -> Self {
        let mut entry = Self::new(&metadata.title, &record.magnet, EntryKind::Magnet)
            .with_metadata(metadata);
        entry.infohash = Some(record.infohash.clone());
        entry.size_bytes = record.total_size;
        entry
    }

    /// Entry pointing at an archived .torrent file, keeping the magnet URI.
    pub fn from_archived_torrent(
        metadata: &TorrentMetadata,
        record: &MagnetRecord,
        url: impl Into<String>,
    ) -> Self {
        let mut entry = Self::new(&metadata.title, url, EntryKind::Torrent).with_metadata(metadata);
        entry.infohash = Some(record.infohash.clone());
        entry.magnet = Some(record.magnet.clone());
        entry.size_bytes = record.total_size;
        entry
    }

    pub fn with_metadata(mut self, metadata: &TorrentMetadata) -> Self {
        self.category = Some(metadata.category);
        self.year = metadata.year.clone();
        self.season = metadata.season;
        self.episode = metadata.episode;
        self.quality = Some(metadata.quality);
        self
    }

    pub fn with_added(mut self, added: impl Into<String>) -> Self {
        self.added = Some(added.into());
        self
    }

    /// Magnet URI for this entry, whichever field holds it.
    pub fn magnet_uri(&self) -> Option<&str> {
        match self.kind {
            EntryKind::Magnet if !self.source.is_empty() => Some(&self.source),
            _ => self.magnet.as_deref(),
        }
    }
}

/// Counts produced by a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub inserted: usize,
    pub updated: usize,
}

impl MergeSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog changed since it was read: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(StoreError),

    #[error("Invalid catalog document: {0}")]
    InvalidDocument(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for CatalogError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => CatalogError::Conflict(msg),
            other => CatalogError::Storage(other),
        }
    }
}
