//! HTTP client for the Telegram Bot API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::TelegramConfig;
use crate::metrics;

use super::{BotApi, TelegramError, TelegramFile};

/// Bot API response envelope.
///
/// Missing fields deserialize as `None`.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

pub struct TelegramClient {
    client: Client,
    config: TelegramConfig,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.bot_token,
            file_path.trim_start_matches('/')
        )
    }

    async fn get_file_inner(&self, file_id: &str) -> Result<TelegramFile, TelegramError> {
        let response = self
            .client
            .get(self.method_url("getFile"))
            .query(&[("file_id", file_id)])
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let body: ApiResponse<TelegramFile> = response.json().await.map_err(|e| {
            TelegramError::InvalidResponse(format!(
                "HTTP {}: failed to parse response: {}",
                status.as_u16(),
                e.without_url()
            ))
        })?;

        match (body.ok, body.result) {
            (true, Some(file)) => Ok(file),
            _ => Err(TelegramError::ApiError(format!(
                "getFile failed (HTTP {}): {}",
                status.as_u16(),
                body.description.unwrap_or_default()
            ))),
        }
    }

    async fn download_inner(
        &self,
        file_path: &str,
        max_bytes: u64,
    ) -> Result<Vec<u8>, TelegramError> {
        let mut response = self
            .client
            .get(self.file_url(file_path))
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TelegramError::ApiError(format!(
                "file download failed: HTTP {}",
                status.as_u16()
            )));
        }

        if let Some(length) = response.content_length() {
            if length > max_bytes {
                return Err(TelegramError::FileTooLarge {
                    size: length,
                    limit: max_bytes,
                });
            }
        }

        let mut buf = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(map_request_error)? {
            let total = (buf.len() + chunk.len()) as u64;
            if total > max_bytes {
                return Err(TelegramError::FileTooLarge {
                    size: total,
                    limit: max_bytes,
                });
            }
            buf.extend_from_slice(&chunk);
        }

        debug!(file_path = %file_path, bytes = buf.len(), "Downloaded file");
        Ok(buf)
    }
}

#[async_trait]
impl BotApi for TelegramClient {
    async fn get_file(&self, file_id: &str) -> Result<TelegramFile, TelegramError> {
        let start = Instant::now();
        let result = self.get_file_inner(file_id).await;
        record_request("get_file", start, result.is_ok());
        result
    }

    async fn download(&self, file_path: &str, max_bytes: u64) -> Result<Vec<u8>, TelegramError> {
        let start = Instant::now();
        let result = self.download_inner(file_path, max_bytes).await;
        record_request("download", start, result.is_ok());
        result
    }
}

fn record_request(operation: &str, start: Instant, ok: bool) {
    metrics::EXTERNAL_SERVICE_DURATION
        .with_label_values(&["telegram", operation])
        .observe(start.elapsed().as_secs_f64());
    metrics::EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&["telegram", operation, if ok { "success" } else { "error" }])
        .inc();
}

/// Request URLs embed the bot token, so it is stripped from errors.
fn map_request_error(e: reqwest::Error) -> TelegramError {
    if e.is_timeout() {
        TelegramError::Timeout
    } else if e.is_connect() {
        TelegramError::ConnectionFailed(e.without_url().to_string())
    } else {
        TelegramError::ApiError(e.without_url().to_string())
    }
}
