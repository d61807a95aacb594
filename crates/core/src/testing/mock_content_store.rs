//! In-memory content store for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::store::{ContentStore, StoreError, StoredFile};

/// A write attempt, recorded for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedWrite {
    pub path: String,
    pub content: Vec<u8>,
    pub message: String,
    /// Revision the caller supplied.
    pub revision: Option<String>,
}

/// Mock implementation of the ContentStore trait.
///
/// Files live in a map keyed by path. Every successful write assigns a new
/// revision, and a write whose revision does not match the stored one fails
/// with [`StoreError::Conflict`], like the GitHub contents API.
///
/// # Example
///
/// ```rust,ignore
/// use tgcatalog_core::testing::MockContentStore;
///
/// let store = MockContentStore::new();
/// store.insert_file("catalog.json", b"[]").await;
/// store.fail_next_write(StoreError::Timeout).await;
/// ```
pub struct MockContentStore {
    files: Arc<RwLock<HashMap<String, StoredFile>>>,
    writes: Arc<RwLock<Vec<RecordedWrite>>>,
    next_read_error: Arc<RwLock<Option<StoreError>>>,
    next_write_error: Arc<RwLock<Option<StoreError>>>,
    revision_counter: AtomicU64,
}

impl std::fmt::Debug for MockContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockContentStore")
            .field("files", &"<files>")
            .field("writes", &"<writes>")
            .finish()
    }
}

impl Default for MockContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockContentStore {
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(HashMap::new())),
            writes: Arc::new(RwLock::new(Vec::new())),
            next_read_error: Arc::new(RwLock::new(None)),
            next_write_error: Arc::new(RwLock::new(None)),
            revision_counter: AtomicU64::new(0),
        }
    }

    fn next_revision(&self) -> String {
        let n = self.revision_counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("rev-{}", n)
    }

    /// Seed a file, returning its revision. Not recorded as a write.
    pub async fn insert_file(&self, path: &str, content: &[u8]) -> String {
        let revision = self.next_revision();
        self.files.write().await.insert(
            path.to_string(),
            StoredFile {
                content: content.to_vec(),
                revision: revision.clone(),
            },
        );
        revision
    }

    pub async fn get_file(&self, path: &str) -> Option<StoredFile> {
        self.files.read().await.get(path).cloned()
    }

    /// Parse a stored file as JSON.
    pub async fn file_json(&self, path: &str) -> Option<serde_json::Value> {
        let file = self.get_file(path).await?;
        serde_json::from_slice(&file.content).ok()
    }

    /// All write attempts, including failed ones.
    pub async fn recorded_writes(&self) -> Vec<RecordedWrite> {
        self.writes.read().await.clone()
    }

    pub async fn write_count(&self) -> usize {
        self.writes.read().await.len()
    }

    /// Configure the next read to fail with the given error.
    pub async fn fail_next_read(&self, error: StoreError) {
        *self.next_read_error.write().await = Some(error);
    }

    /// Configure the next write to fail with the given error.
    pub async fn fail_next_write(&self, error: StoreError) {
        *self.next_write_error.write().await = Some(error);
    }
}

#[async_trait]
impl ContentStore for MockContentStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn read(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        if let Some(error) = self.next_read_error.write().await.take() {
            return Err(error);
        }
        Ok(self.files.read().await.get(path).cloned())
    }

    async fn write(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        revision: Option<&str>,
    ) -> Result<String, StoreError> {
        self.writes.write().await.push(RecordedWrite {
            path: path.to_string(),
            content: content.to_vec(),
            message: message.to_string(),
            revision: revision.map(str::to_string),
        });

        if let Some(error) = self.next_write_error.write().await.take() {
            return Err(error);
        }

        let mut files = self.files.write().await;
        let current = files.get(path).map(|f| f.revision.as_str());
        if current != revision {
            return Err(StoreError::Conflict(format!(
                "{} is at {:?}, write supplied {:?}",
                path, current, revision
            )));
        }

        let new_revision = self.next_revision();
        files.insert(
            path.to_string(),
            StoredFile {
                content: content.to_vec(),
                revision: new_revision.clone(),
            },
        );
        Ok(new_revision)
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://raw.example.test/owner/catalog/main/{}", path)
    }
}
