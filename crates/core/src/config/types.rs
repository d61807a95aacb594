use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::classifier::CapSeasonPolicy;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub telegram: TelegramConfig,
    pub github: GithubConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Webhook authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` value (required for `secret_token`)
    #[serde(default)]
    pub secret_token: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    SecretToken,
}

/// Telegram Bot API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Bot API base URL (default: "https://api.telegram.org")
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
    /// Chats allowed to post into the catalog. Empty means any chat.
    #[serde(default)]
    pub allowed_chat_ids: Vec<i64>,
    /// Request timeout in seconds (default: 20)
    #[serde(default = "default_telegram_timeout")]
    pub timeout_secs: u32,
    /// Largest attachment that will be downloaded (default: 10 MiB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_telegram_timeout() -> u32 {
    20
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

/// GitHub repository used as the catalog store
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubConfig {
    /// "owner/name"
    pub repo: String,
    pub token: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
    /// Directory for archived .torrent files
    #[serde(default = "default_torrents_dir")]
    pub torrents_dir: String,
    /// Upload received .torrent files and reference them by URL
    #[serde(default)]
    pub archive_torrents: bool,
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
    #[serde(default = "default_github_raw_url")]
    pub raw_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_github_timeout")]
    pub timeout_secs: u32,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_catalog_path() -> String {
    "catalog.json".to_string()
}

fn default_torrents_dir() -> String {
    "torrents".to_string()
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_github_raw_url() -> String {
    "https://raw.githubusercontent.com".to_string()
}

fn default_github_timeout() -> u32 {
    30
}

/// Persisted catalog layout
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CatalogLayout {
    /// JSON array of entries keyed by `source`
    #[default]
    Flat,
    /// `{ "movie": {...}, "series": {...} }` grouped by title/year or title/season
    Nested,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub layout: CatalogLayout,
    #[serde(default)]
    pub cap_season_policy: CapSeasonPolicy,
}

/// Processed attachment cache
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DedupConfig {
    #[serde(default = "default_dedup_capacity")]
    pub capacity: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            capacity: default_dedup_capacity(),
        }
    }
}

fn default_dedup_capacity() -> usize {
    1000
}

/// Recent update journal served at `/api/debug/last`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DebugConfig {
    /// Zero disables the journal.
    #[serde(default = "default_journal_capacity")]
    pub journal_capacity: usize,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            journal_capacity: default_journal_capacity(),
        }
    }
}

fn default_journal_capacity() -> usize {
    50
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub telegram: SanitizedTelegramConfig,
    pub github: SanitizedGithubConfig,
    pub catalog: CatalogConfig,
    pub dedup: DedupConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub secret_token_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTelegramConfig {
    pub api_url: String,
    pub bot_token_configured: bool,
    pub allowed_chat_ids: Vec<i64>,
    pub timeout_secs: u32,
    pub max_file_size_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedGithubConfig {
    pub repo: String,
    pub branch: String,
    pub catalog_path: String,
    pub torrents_dir: String,
    pub archive_torrents: bool,
    pub api_url: String,
    pub token_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::SecretToken => "secret_token".to_string(),
                },
                secret_token_configured: config
                    .auth
                    .secret_token
                    .as_ref()
                    .is_some_and(|t| !t.is_empty()),
            },
            server: config.server.clone(),
            telegram: SanitizedTelegramConfig {
                api_url: config.telegram.api_url.clone(),
                bot_token_configured: !config.telegram.bot_token.is_empty(),
                allowed_chat_ids: config.telegram.allowed_chat_ids.clone(),
                timeout_secs: config.telegram.timeout_secs,
                max_file_size_bytes: config.telegram.max_file_size_bytes,
            },
            github: SanitizedGithubConfig {
                repo: config.github.repo.clone(),
                branch: config.github.branch.clone(),
                catalog_path: config.github.catalog_path.clone(),
                torrents_dir: config.github.torrents_dir.clone(),
                archive_torrents: config.github.archive_torrents,
                api_url: config.github.api_url.clone(),
                token_configured: !config.github.token.is_empty(),
                timeout_secs: config.github.timeout_secs,
            },
            catalog: config.catalog.clone(),
            dedup: config.dedup.clone(),
            debug: config.debug.clone(),
        }
    }
}
