use librqbit_core::torrent_metainfo::{torrent_from_bytes, TorrentMetaV1Owned};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::magnet::build_magnet;

/// Errors that can occur when reading a `.torrent` file.
#[derive(Debug, Error)]
pub enum TorrentError {
    #[error("Failed to parse torrent: {0}")]
    ParseError(String),
}

/// Everything needed to reference a torrent without the original file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagnetRecord {
    /// Lowercase hex SHA-1 of the `info` dictionary exactly as it appears in the file.
    pub infohash: String,
    /// Tracker announce URLs, tier order preserved, duplicates kept.
    pub trackers: Vec<String>,
    pub magnet: String,
    /// `info.name`, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Total payload size in bytes (single or multi-file).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_size: Option<u64>,
}

/// Decode a `.torrent` file and build its magnet record.
///
/// The info hash is taken over the raw `info` bytes, so dictionaries written
/// with unsorted keys still hash the way every BitTorrent client hashes them.
pub fn compute_magnet(bytes: &[u8]) -> Result<MagnetRecord, TorrentError> {
    let torrent: TorrentMetaV1Owned =
        torrent_from_bytes(bytes).map_err(|e| TorrentError::ParseError(e.to_string()))?;

    let infohash = torrent.info_hash.as_string();
    let trackers = collect_trackers(&torrent);
    let magnet = build_magnet(&infohash, &trackers);

    let info = &torrent.info;
    let name = info
        .name
        .as_ref()
        .map(|b| String::from_utf8_lossy(b.as_ref()).into_owned());

    Ok(MagnetRecord {
        infohash,
        trackers,
        magnet,
        name,
        total_size: total_size(&torrent),
    })
}

/// Flatten `announce-list` tier by tier; fall back to `announce` only when the
/// list is absent or yields nothing.
fn collect_trackers(torrent: &TorrentMetaV1Owned) -> Vec<String> {
    let mut trackers: Vec<String> = torrent
        .announce_list
        .iter()
        .flatten()
        .map(|url| String::from_utf8_lossy(url.as_ref()).into_owned())
        .collect();

    if trackers.is_empty() {
        if let Some(announce) = &torrent.announce {
            trackers.push(String::from_utf8_lossy(announce.as_ref()).into_owned());
        }
    }

    trackers
}

fn total_size(torrent: &TorrentMetaV1Owned) -> Option<u64> {
    let info = &torrent.info;
    if let Some(length) = info.length {
        return Some(length);
    }
    info.files
        .as_ref()
        .map(|files| files.iter().fold(0u64, |acc, f| acc.saturating_add(f.length)))
}
