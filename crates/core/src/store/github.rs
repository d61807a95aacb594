//! GitHub contents API backend.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::GithubConfig;
use crate::metrics;

use super::{ContentStore, StoreError, StoredFile};

const USER_AGENT: &str = concat!("tgcatalog/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";

/// `GET /repos/{repo}/contents/{path}` response for a file.
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String,
}

/// Stores files in a GitHub repository branch.
pub struct GitHubContentStore {
    client: Client,
    config: GithubConfig,
}

impl GitHubContentStore {
    pub fn new(config: GithubConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.repo,
            encode_path(path)
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.config.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn fetch_download_url(&self, url: &str) -> Result<Vec<u8>, StoreError> {
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(map_request_error)
    }

    async fn read_inner(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        let response = self
            .authorized(self.client.get(self.contents_url(path)))
            .query(&[("ref", self.config.branch.as_str())])
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(path = %path, "File not found in repository");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let body: ContentsResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let inline = match (body.encoding.as_deref(), body.content.as_deref()) {
            (Some("base64"), Some(content)) if !content.trim().is_empty() => {
                Some(decode_content(content)?)
            }
            _ => None,
        };

        let content = match (inline, body.download_url) {
            (Some(content), _) => content,
            // Files over 1 MB come back without inline content.
            (None, Some(url)) => self.fetch_download_url(&url).await?,
            (None, None) => Vec::new(),
        };

        Ok(Some(StoredFile {
            content,
            revision: body.sha,
        }))
    }

    async fn write_inner(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        revision: Option<&str>,
    ) -> Result<String, StoreError> {
        let request = PutRequest {
            message,
            content: STANDARD.encode(content),
            branch: &self.config.branch,
            sha: revision,
        };

        let response = self
            .authorized(self.client.put(self.contents_url(path)))
            .json(&request)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let body: PutResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(body.content.sha)
    }
}

#[async_trait]
impl ContentStore for GitHubContentStore {
    fn name(&self) -> &str {
        "github"
    }

    async fn read(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        let start = Instant::now();
        let result = self.read_inner(path).await;
        record_request("read", start, result.is_ok());
        result
    }

    async fn write(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        revision: Option<&str>,
    ) -> Result<String, StoreError> {
        let start = Instant::now();
        let result = self.write_inner(path, content, message, revision).await;
        record_request("write", start, result.is_ok());
        if let Err(e) = &result {
            warn!(path = %path, error = %e, "GitHub write failed");
        }
        result
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.config.raw_url.trim_end_matches('/'),
            self.config.repo,
            self.config.branch,
            encode_path(path)
        )
    }
}

fn record_request(operation: &str, start: Instant, ok: bool) {
    metrics::EXTERNAL_SERVICE_DURATION
        .with_label_values(&["github", operation])
        .observe(start.elapsed().as_secs_f64());
    metrics::EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&["github", operation, if ok { "success" } else { "error" }])
        .inc();
}

/// Percent-encode each path segment, keeping the separators.
fn encode_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// GitHub wraps base64 content at 60 columns.
fn decode_content(content: &str) -> Result<Vec<u8>, StoreError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| StoreError::InvalidResponse(format!("Invalid base64 content: {}", e)))
}

fn map_request_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout
    } else if e.is_connect() {
        StoreError::ConnectionFailed(e.to_string())
    } else {
        StoreError::ApiError(e.to_string())
    }
}

fn status_error(status: StatusCode, body: &str) -> StoreError {
    let detail = format!("HTTP {}: {}", status.as_u16(), body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized(detail),
        StatusCode::CONFLICT => StoreError::Conflict(detail),
        // Creating a file that already exists reports the missing sha as 422.
        StatusCode::UNPROCESSABLE_ENTITY if body.contains("\"sha\"") => {
            StoreError::Conflict(detail)
        }
        StatusCode::UNPROCESSABLE_ENTITY => StoreError::Rejected(detail),
        _ => StoreError::ApiError(detail),
    }
}
