//! Telegram Bot API: webhook update model and file downloads.

mod client;
mod types;

pub use client::TelegramClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Bot API error: {0}")]
    ApiError(String),

    #[error("File is {size} bytes, limit is {limit}")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("getFile returned no file_path for {0}")]
    MissingFilePath(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// The subset of the Bot API the ingest path uses.
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Resolve a `file_id` to a downloadable path.
    async fn get_file(&self, file_id: &str) -> Result<TelegramFile, TelegramError>;

    /// Download a file, failing with [`TelegramError::FileTooLarge`] as soon
    /// as it is known to exceed `max_bytes`.
    async fn download(&self, file_path: &str, max_bytes: u64) -> Result<Vec<u8>, TelegramError>;
}
