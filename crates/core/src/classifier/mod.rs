//! Filename classification.
//!
//! Derives a display title, year, quality and movie/series split from a
//! release filename. This is a heuristic: odd names can produce an empty or
//! misleading title and nothing here validates the result.

mod filename;
mod types;

pub use filename::{canonical_movie_key, canonical_series_key, classify};
pub use types::*;
