//! Mock Telegram Bot API for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::telegram::{BotApi, TelegramError, TelegramFile};

#[derive(Debug, Clone)]
struct MockFile {
    file_path: String,
    content: Vec<u8>,
    /// Size reported by `getFile`; `None` hides it.
    declared_size: Option<u64>,
}

/// Mock implementation of the BotApi trait.
///
/// Serves files registered with [`MockBotApi::add_file`] and records every
/// `getFile` and download call. Downloads larger than the requested cap
/// fail with [`TelegramError::FileTooLarge`].
pub struct MockBotApi {
    files: Arc<RwLock<HashMap<String, MockFile>>>,
    get_file_calls: Arc<RwLock<Vec<String>>>,
    downloads: Arc<RwLock<Vec<String>>>,
    next_error: Arc<RwLock<Option<TelegramError>>>,
}

impl std::fmt::Debug for MockBotApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBotApi")
            .field("files", &"<files>")
            .finish()
    }
}

impl Default for MockBotApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBotApi {
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(HashMap::new())),
            get_file_calls: Arc::new(RwLock::new(Vec::new())),
            downloads: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Register a downloadable file under `file_id`.
    pub async fn add_file(&self, file_id: &str, content: Vec<u8>) {
        let size = content.len() as u64;
        self.add_file_with_declared_size(file_id, content, Some(size))
            .await;
    }

    /// Register a file whose `getFile` size differs from its content.
    pub async fn add_file_with_declared_size(
        &self,
        file_id: &str,
        content: Vec<u8>,
        declared_size: Option<u64>,
    ) {
        self.files.write().await.insert(
            file_id.to_string(),
            MockFile {
                file_path: format!("documents/{}.torrent", file_id),
                content,
                declared_size,
            },
        );
    }

    /// Configure the next `getFile` call to fail with the given error.
    pub async fn set_next_error(&self, error: TelegramError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn get_file_calls(&self) -> Vec<String> {
        self.get_file_calls.read().await.clone()
    }

    /// File paths passed to `download`.
    pub async fn downloads(&self) -> Vec<String> {
        self.downloads.read().await.clone()
    }
}

#[async_trait]
impl BotApi for MockBotApi {
    async fn get_file(&self, file_id: &str) -> Result<TelegramFile, TelegramError> {
        self.get_file_calls.write().await.push(file_id.to_string());

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let files = self.files.read().await;
        let file = files.get(file_id).ok_or_else(|| {
            TelegramError::ApiError("Bad Request: invalid file_id".to_string())
        })?;

        Ok(TelegramFile {
            file_id: file_id.to_string(),
            file_path: Some(file.file_path.clone()),
            file_size: file.declared_size,
        })
    }

    async fn download(&self, file_path: &str, max_bytes: u64) -> Result<Vec<u8>, TelegramError> {
        self.downloads.write().await.push(file_path.to_string());

        let files = self.files.read().await;
        let file = files
            .values()
            .find(|f| f.file_path == file_path)
            .ok_or_else(|| TelegramError::ApiError("file download failed: HTTP 404".to_string()))?;

        let size = file.content.len() as u64;
        if size > max_bytes {
            return Err(TelegramError::FileTooLarge {
                size,
                limit: max_bytes,
            });
        }
        Ok(file.content.clone())
    }
}
