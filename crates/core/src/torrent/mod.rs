//! Torrent metadata extraction and magnet URI handling.
//!
//! `.torrent` files are parsed with librqbit-core; the info hash is the
//! SHA-1 of the `info` dictionary bytes as they appear in the file.

mod magnet;
mod metainfo;

pub use magnet::{build_magnet, encode_tracker, find_magnets, parse_magnet, MagnetError, MagnetLink};
pub use metainfo::{compute_magnet, MagnetRecord, TorrentError};
