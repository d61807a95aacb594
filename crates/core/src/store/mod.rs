//! Versioned file storage backing the catalog and archived torrents.

mod github;

pub use github::GitHubContentStore;

use async_trait::async_trait;
use thiserror::Error;

/// A file read from the store together with its revision marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub content: Vec<u8>,
    /// Opaque marker that must accompany the next write of this path.
    pub revision: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Revision conflict: {0}")]
    Conflict(String),

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Optimistically-concurrent file store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Name of this backend, used in logs and metrics.
    fn name(&self) -> &str;

    /// Read a file. Returns `None` when the path does not exist.
    async fn read(&self, path: &str) -> Result<Option<StoredFile>, StoreError>;

    /// Replace a file with `content`.
    ///
    /// `revision` must be the marker returned by the last read of `path`, or
    /// `None` when the file is being created. A stale marker yields
    /// [`StoreError::Conflict`]. Returns the new revision.
    async fn write(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        revision: Option<&str>,
    ) -> Result<String, StoreError>;

    /// Publicly reachable URL of a stored file.
    fn public_url(&self, path: &str) -> String;
}
