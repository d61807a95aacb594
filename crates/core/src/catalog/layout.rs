//! In-memory catalog documents and the merge rules for each layout.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::classifier::{canonical_movie_key, canonical_series_key, Category, Quality};
use crate::config::CatalogLayout;

use super::{CatalogEntry, CatalogError, EntryKind, MergeSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Upsert {
    Inserted,
    Updated,
}

impl MergeSummary {
    fn record(&mut self, action: Upsert) {
        match action {
            Upsert::Inserted => self.inserted += 1,
            Upsert::Updated => self.updated += 1,
        }
    }
}

// =============================================================================
// Flat layout
// =============================================================================

/// JSON array of entries, unique by `source`, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatCatalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl FlatCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored entries, collapsing repeated sources. A repeated
    /// source keeps its first position and takes the later values.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let mut catalog = Self::new();
        for entry in entries {
            catalog.upsert(entry);
        }
        catalog
    }

    fn upsert(&mut self, entry: CatalogEntry) -> Upsert {
        match self.index.get(&entry.source) {
            Some(&pos) => {
                self.entries[pos] = entry;
                Upsert::Updated
            }
            None => {
                self.index.insert(entry.source.clone(), self.entries.len());
                self.entries.push(entry);
                Upsert::Inserted
            }
        }
    }

    pub fn merge(&mut self, batch: &[CatalogEntry]) -> MergeSummary {
        let mut summary = MergeSummary::default();
        for entry in batch {
            summary.record(self.upsert(entry.clone()));
        }
        summary
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, source: &str) -> Option<&CatalogEntry> {
        self.index.get(source).map(|&pos| &self.entries[pos])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Nested layout
// =============================================================================

/// One release of a title inside a nested group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub magnet: String,
    #[serde(default)]
    pub infohash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default = "unknown_quality")]
    pub quality: String,
    /// Human readable size, e.g. "1.37 GB".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn unknown_quality() -> String {
    Quality::Unknown.as_str().to_string()
}

/// Releases sharing a title and year (movies) or title and season (series).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub title: String,
    #[serde(default)]
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default)]
    pub torrents: Vec<Release>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `{ "movie": { key: Group }, "series": { key: Group } }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NestedCatalog {
    #[serde(default, alias = "movies")]
    pub movie: BTreeMap<String, Group>,
    #[serde(default)]
    pub series: BTreeMap<String, Group>,
}

impl NestedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn upsert(&mut self, entry: &CatalogEntry) -> Upsert {
        let year = entry.year.clone().unwrap_or_default();
        let (groups, key, season) = match entry.category.unwrap_or_default() {
            Category::Movie => (
                &mut self.movie,
                canonical_movie_key(&entry.title, entry.year.as_deref()),
                None,
            ),
            Category::Series => {
                let season = entry.season.unwrap_or(1);
                (
                    &mut self.series,
                    canonical_series_key(&entry.title, season),
                    Some(season),
                )
            }
        };

        let group = groups.entry(key).or_insert_with(|| Group {
            title: entry.title.clone(),
            year,
            season,
            torrents: Vec::new(),
            extra: serde_json::Map::new(),
        });

        let release = release_from_entry(entry);
        let existing = group.torrents.iter().position(|r| {
            if !release.infohash.is_empty() {
                r.infohash.eq_ignore_ascii_case(&release.infohash)
            } else {
                r.source.is_some() && r.source == release.source
            }
        });

        match existing {
            Some(pos) => {
                let extra = std::mem::take(&mut group.torrents[pos].extra);
                group.torrents[pos] = Release { extra, ..release };
                Upsert::Updated
            }
            None => {
                group.torrents.push(release);
                Upsert::Inserted
            }
        }
    }

    pub fn merge(&mut self, batch: &[CatalogEntry]) -> MergeSummary {
        let mut summary = MergeSummary::default();
        for entry in batch {
            summary.record(self.upsert(entry));
        }
        summary
    }

    /// Number of releases across all groups.
    pub fn len(&self) -> usize {
        self.movie
            .values()
            .chain(self.series.values())
            .map(|g| g.torrents.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into entries, one per release.
    pub fn to_entries(&self) -> Vec<CatalogEntry> {
        let movies = self.movie.values().map(|g| (Category::Movie, g));
        let series = self.series.values().map(|g| (Category::Series, g));

        movies
            .chain(series)
            .flat_map(|(category, group)| {
                group.torrents.iter().map(move |release| {
                    let (source, kind, magnet) = match &release.source {
                        Some(src) if *src != release.magnet => {
                            (src.clone(), EntryKind::Torrent, Some(release.magnet.clone()))
                        }
                        _ => (release.magnet.clone(), EntryKind::Magnet, None),
                    };
                    let mut entry = CatalogEntry::new(&group.title, source, kind);
                    entry.category = Some(category);
                    entry.year = Some(group.year.clone()).filter(|y| !y.is_empty());
                    entry.season = group.season;
                    entry.quality = parse_quality(&release.quality);
                    entry.infohash = Some(release.infohash.clone()).filter(|h| !h.is_empty());
                    entry.magnet = magnet;
                    entry.added = release.added.clone();
                    entry
                })
            })
            .collect()
    }
}

impl From<&FlatCatalog> for NestedCatalog {
    fn from(flat: &FlatCatalog) -> Self {
        let mut nested = NestedCatalog::new();
        nested.merge(flat.entries());
        nested
    }
}

impl From<&NestedCatalog> for FlatCatalog {
    fn from(nested: &NestedCatalog) -> Self {
        FlatCatalog::from_entries(nested.to_entries())
    }
}

fn release_from_entry(entry: &CatalogEntry) -> Release {
    Release {
        magnet: entry.magnet_uri().unwrap_or_default().to_string(),
        infohash: entry.infohash.clone().unwrap_or_default(),
        source: Some(entry.source.clone()).filter(|s| !s.is_empty()),
        quality: entry.quality.unwrap_or_default().as_str().to_string(),
        size: entry.size_bytes.map(format_size_gb),
        added: entry.added.clone(),
        extra: serde_json::Map::new(),
    }
}

fn parse_quality(s: &str) -> Option<Quality> {
    match s {
        "720p" => Some(Quality::Hd720),
        "1080p" => Some(Quality::Hd1080),
        "4K" => Some(Quality::Uhd4k),
        "Unknown" => Some(Quality::Unknown),
        _ => None,
    }
}

/// Bytes as gibibytes with two decimals.
pub fn format_size_gb(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
}

// =============================================================================
// Document
// =============================================================================

/// A catalog in its configured persisted layout.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogDocument {
    Flat(FlatCatalog),
    Nested(NestedCatalog),
}

impl CatalogDocument {
    pub fn empty(layout: CatalogLayout) -> Self {
        match layout {
            CatalogLayout::Flat => CatalogDocument::Flat(FlatCatalog::new()),
            CatalogLayout::Nested => CatalogDocument::Nested(NestedCatalog::new()),
        }
    }

    /// JSON value of an empty document in `layout`.
    pub fn empty_json(layout: CatalogLayout) -> serde_json::Value {
        match layout {
            CatalogLayout::Flat => serde_json::json!([]),
            CatalogLayout::Nested => serde_json::json!({ "movie": {}, "series": {} }),
        }
    }

    /// Parse stored bytes into `layout`.
    ///
    /// A JSON array is read as flat entries and a JSON object as the nested
    /// layout; either is converted when it does not match `layout`. Empty
    /// input is an empty document.
    pub fn parse(layout: CatalogLayout, bytes: &[u8]) -> Result<Self, CatalogError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::empty(layout));
        }

        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| CatalogError::InvalidDocument(e.to_string()))?;

        let stored = match value {
            serde_json::Value::Array(_) => {
                let entries: Vec<CatalogEntry> = serde_json::from_value(value)
                    .map_err(|e| CatalogError::InvalidDocument(e.to_string()))?;
                CatalogDocument::Flat(FlatCatalog::from_entries(entries))
            }
            serde_json::Value::Object(_) => {
                let nested: NestedCatalog = serde_json::from_value(value)
                    .map_err(|e| CatalogError::InvalidDocument(e.to_string()))?;
                CatalogDocument::Nested(nested)
            }
            serde_json::Value::Null => return Ok(Self::empty(layout)),
            other => {
                return Err(CatalogError::InvalidDocument(format!(
                    "expected array or object, found {}",
                    json_type_name(&other)
                )))
            }
        };

        Ok(stored.into_layout(layout))
    }

    /// Convert to `layout`, migrating entries when needed.
    pub fn into_layout(self, layout: CatalogLayout) -> Self {
        match (self, layout) {
            (CatalogDocument::Flat(flat), CatalogLayout::Nested) => {
                CatalogDocument::Nested(NestedCatalog::from(&flat))
            }
            (CatalogDocument::Nested(nested), CatalogLayout::Flat) => {
                CatalogDocument::Flat(FlatCatalog::from(&nested))
            }
            (doc, _) => doc,
        }
    }

    pub fn layout(&self) -> CatalogLayout {
        match self {
            CatalogDocument::Flat(_) => CatalogLayout::Flat,
            CatalogDocument::Nested(_) => CatalogLayout::Nested,
        }
    }

    pub fn merge(&mut self, batch: &[CatalogEntry]) -> MergeSummary {
        match self {
            CatalogDocument::Flat(flat) => flat.merge(batch),
            CatalogDocument::Nested(nested) => nested.merge(batch),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CatalogDocument::Flat(flat) => flat.len(),
            CatalogDocument::Nested(nested) => nested.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>, CatalogError> {
        let mut bytes = match self {
            CatalogDocument::Flat(flat) => serde_json::to_vec_pretty(flat.entries())?,
            CatalogDocument::Nested(nested) => serde_json::to_vec_pretty(nested)?,
        };
        bytes.push(b'\n');
        Ok(bytes)
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
