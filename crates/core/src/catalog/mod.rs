//! Torrent catalog: entry model, persisted layouts and the merge cycle.

mod layout;
mod service;
mod types;

pub use layout::*;
pub use service::*;
pub use types::*;
