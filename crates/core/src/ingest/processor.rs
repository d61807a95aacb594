//! Per-update ingest pipeline.

use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogEntry, CatalogService, EntryKind};
use crate::classifier::{classify, CapSeasonPolicy, TorrentMetadata};
use crate::config::Config;
use crate::dedup::ProcessedCache;
use crate::metrics;
use crate::store::ContentStore;
use crate::telegram::{BotApi, Document, Message, TelegramError, Update};
use crate::torrent::{compute_magnet, find_magnets, parse_magnet, MagnetRecord};

use super::{
    IngestError, IngestOutcome, IngestReport, ItemErrorCode, ItemFailure, ItemKind, ItemOutcome,
};

/// Longest title taken from the first line of a message.
const MAX_TEXT_TITLE_CHARS: usize = 120;

/// Highest ` (n)` suffix tried before archiving gives up.
const MAX_ARCHIVE_SUFFIX: usize = 100;

/// Tunables the processor reads from configuration.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Empty means every chat is allowed.
    pub allowed_chat_ids: Vec<i64>,
    pub max_file_size_bytes: u64,
    pub archive_torrents: bool,
    pub torrents_dir: String,
    pub cap_season_policy: CapSeasonPolicy,
}

impl IngestSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            allowed_chat_ids: config.telegram.allowed_chat_ids.clone(),
            max_file_size_bytes: config.telegram.max_file_size_bytes,
            archive_torrents: config.github.archive_torrents,
            torrents_dir: config.github.torrents_dir.clone(),
            cap_season_policy: config.catalog.cap_season_policy,
        }
    }
}

/// Handles one webhook update to completion.
pub struct IngestProcessor {
    bot: Arc<dyn BotApi>,
    store: Arc<dyn ContentStore>,
    catalog: Arc<CatalogService>,
    cache: Arc<ProcessedCache>,
    settings: IngestSettings,
}

impl IngestProcessor {
    pub fn new(
        bot: Arc<dyn BotApi>,
        store: Arc<dyn ContentStore>,
        catalog: Arc<CatalogService>,
        cache: Arc<ProcessedCache>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            bot,
            store,
            catalog,
            cache,
            settings,
        }
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    fn chat_allowed(&self, chat_id: i64) -> bool {
        self.settings.allowed_chat_ids.is_empty()
            || self.settings.allowed_chat_ids.contains(&chat_id)
    }

    pub async fn handle(&self, update: &Update) -> Result<IngestOutcome, IngestError> {
        let Some(message) = update.payload() else {
            debug!(update_id = update.update_id, "Update has no message payload");
            metrics::UPDATES_TOTAL.with_label_values(&["ignored"]).inc();
            return Ok(IngestOutcome::Ignored);
        };

        let chat_id = message.chat.id;
        if !self.chat_allowed(chat_id) {
            warn!(update_id = update.update_id, chat_id, "Rejected update from chat not in allow-list");
            metrics::UPDATES_TOTAL.with_label_values(&["rejected"]).inc();
            return Err(IngestError::ChatNotAllowed(chat_id));
        }

        let added_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut report = IngestReport::default();
        let mut batch = Vec::new();
        let mut marked = Vec::new();

        for uri in find_magnets(&message.body()) {
            let outcome = match self.magnet_entry(message, &uri) {
                Ok(entry) => {
                    let outcome = ItemOutcome::succeeded(
                        ItemKind::Magnet,
                        &uri,
                        &entry.title,
                        entry.infohash.clone().unwrap_or_default(),
                    );
                    batch.push(entry.with_added(&added_at));
                    outcome
                }
                Err(failure) => ItemOutcome::failed(ItemKind::Magnet, &uri, failure),
            };
            record_item(&outcome);
            report.processed.push(outcome);
        }

        if let Some(document) = message.document.as_ref().filter(|d| d.is_torrent()) {
            let key = dedup_key(document);
            if self.cache.check_and_mark(key) {
                let source = document
                    .file_name
                    .clone()
                    .unwrap_or_else(|| document.file_id.clone());
                let outcome = match self.document_entry(document).await {
                    Ok(entry) => {
                        marked.push(key.to_string());
                        let outcome = ItemOutcome::succeeded(
                            ItemKind::Torrent,
                            &source,
                            &entry.title,
                            entry.infohash.clone().unwrap_or_default(),
                        );
                        batch.push(entry.with_added(&added_at));
                        outcome
                    }
                    Err(failure) => {
                        self.cache.forget(key);
                        warn!(
                            file_id = %document.file_id,
                            code = failure.code.as_str(),
                            error = %failure.message,
                            "Attachment failed"
                        );
                        ItemOutcome::failed(ItemKind::Torrent, &source, failure)
                    }
                };
                record_item(&outcome);
                report.processed.push(outcome);
            } else {
                debug!(file_id = %document.file_id, "Attachment already processed, skipping");
                metrics::DUPLICATE_ATTACHMENTS.inc();
                report.skipped += 1;
            }
        }

        if !batch.is_empty() {
            let commit_message = commit_message(&batch);
            match self.catalog.merge_and_save(&batch, &commit_message).await {
                Ok(summary) => report.added = summary.total(),
                Err(e) => {
                    // Redelivery of this update must be able to retry the attachment.
                    for key in &marked {
                        self.cache.forget(key);
                    }
                    metrics::UPDATES_TOTAL.with_label_values(&["failed"]).inc();
                    return Err(IngestError::Storage(e));
                }
            }
        }

        metrics::UPDATES_TOTAL.with_label_values(&["processed"]).inc();
        info!(
            update_id = update.update_id,
            chat_id,
            items = report.processed.len(),
            added = report.added,
            skipped = report.skipped,
            "Update processed"
        );
        Ok(IngestOutcome::Processed(report))
    }

    fn magnet_entry(&self, message: &Message, uri: &str) -> Result<CatalogEntry, ItemFailure> {
        let link = parse_magnet(uri)
            .map_err(|e| ItemFailure::new(ItemErrorCode::InvalidMagnet, e.to_string()))?;

        let metadata = match link.display_name.as_deref().filter(|dn| !dn.trim().is_empty()) {
            Some(dn) => classify(dn, self.settings.cap_season_policy),
            None => text_metadata(message, &link.info_hash),
        };

        let mut entry = CatalogEntry::new(&metadata.title, uri, EntryKind::Magnet)
            .with_metadata(&metadata);
        entry.infohash = Some(link.info_hash);
        Ok(entry)
    }

    async fn document_entry(&self, document: &Document) -> Result<CatalogEntry, ItemFailure> {
        let limit = self.settings.max_file_size_bytes;
        check_size(document.file_size, limit)?;

        let file = self
            .bot
            .get_file(&document.file_id)
            .await
            .map_err(download_failure)?;
        check_size(file.file_size, limit)?;

        let file_path = file.file_path.ok_or_else(|| {
            ItemFailure::new(
                ItemErrorCode::DownloadFailed,
                TelegramError::MissingFilePath(document.file_id.clone()).to_string(),
            )
        })?;

        let bytes = self
            .bot
            .download(&file_path, limit)
            .await
            .map_err(download_failure)?;
        metrics::TORRENT_DOWNLOAD_BYTES
            .with_label_values(&[])
            .observe(bytes.len() as f64);

        let record = compute_magnet(&bytes)
            .map_err(|e| ItemFailure::new(ItemErrorCode::MalformedTorrent, e.to_string()))?;

        let file_name = document
            .file_name
            .clone()
            .or_else(|| record.name.clone())
            .unwrap_or_else(|| record.infohash.clone());
        let metadata = classify(&file_name, self.settings.cap_season_policy);

        let entry = if self.settings.archive_torrents {
            let url = self.archive(&file_name, &record, &bytes).await?;
            CatalogEntry::from_archived_torrent(&metadata, &record, url)
        } else {
            CatalogEntry::from_magnet(&metadata, &record)
        };

        debug!(
            file_name = %file_name,
            infohash = %record.infohash,
            title = %metadata.title,
            "Attachment decoded"
        );
        Ok(entry)
    }

    /// Store the raw .torrent and return its public URL.
    ///
    /// A different torrent already stored under the same name keeps its
    /// path; this one gets the first free ` (n)` variant instead.
    async fn archive(
        &self,
        file_name: &str,
        record: &MagnetRecord,
        bytes: &[u8],
    ) -> Result<String, ItemFailure> {
        let dir = self.settings.torrents_dir.trim_matches('/');
        let file_name = sanitize_file_name(file_name, &record.infohash);
        let archive_failure =
            |e: crate::store::StoreError| ItemFailure::new(ItemErrorCode::ArchiveFailed, e.to_string());

        for attempt in 0..=MAX_ARCHIVE_SUFFIX {
            let path = format!("{}/{}", dir, numbered_file_name(&file_name, attempt));
            match self.store.read(&path).await.map_err(archive_failure)? {
                Some(file) if file.content == bytes => {
                    debug!(path = %path, "Torrent already archived");
                    return Ok(self.store.public_url(&path));
                }
                Some(_) => {
                    debug!(path = %path, "Archive name taken by another torrent");
                }
                None => {
                    let message = format!("Archive torrent {}", record.infohash);
                    self.store
                        .write(&path, bytes, &message, None)
                        .await
                        .map_err(archive_failure)?;
                    return Ok(self.store.public_url(&path));
                }
            }
        }

        Err(ItemFailure::new(
            ItemErrorCode::ArchiveFailed,
            format!("No free archive name for {}", file_name),
        ))
    }
}

fn record_item(outcome: &ItemOutcome) {
    let result = outcome.error_code.map_or("ok", |code| code.as_str());
    metrics::INGEST_ITEMS_TOTAL
        .with_label_values(&[outcome.kind.as_str(), result])
        .inc();
}

fn check_size(size: Option<u64>, limit: u64) -> Result<(), ItemFailure> {
    match size {
        Some(size) if size > limit => Err(too_large(size, limit)),
        _ => Ok(()),
    }
}

fn too_large(size: u64, limit: u64) -> ItemFailure {
    ItemFailure::new(
        ItemErrorCode::FileTooLarge,
        TelegramError::FileTooLarge { size, limit }.to_string(),
    )
}

fn download_failure(e: TelegramError) -> ItemFailure {
    match e {
        TelegramError::FileTooLarge { size, limit } => too_large(size, limit),
        other => ItemFailure::new(ItemErrorCode::DownloadFailed, other.to_string()),
    }
}

fn dedup_key(document: &Document) -> &str {
    document
        .file_unique_id
        .as_deref()
        .unwrap_or(&document.file_id)
}

/// Title for a magnet without `dn`: the first message line that is not a
/// magnet link, else the info hash.
fn text_metadata(message: &Message, info_hash: &str) -> TorrentMetadata {
    let body = message.body();
    let title = body
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.to_ascii_lowercase().starts_with("magnet:"))
        .map(|line| line.chars().take(MAX_TEXT_TITLE_CHARS).collect::<String>())
        .unwrap_or_else(|| info_hash.to_string());

    TorrentMetadata {
        title,
        year: None,
        quality: Default::default(),
        category: Default::default(),
        season: None,
        episode: None,
    }
}

/// File name safe for a repository path, always ending in `.torrent`.
fn sanitize_file_name(name: &str, fallback: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            c if c.is_alphanumeric() => c,
            '.' | '-' | '_' | ' ' | '(' | ')' | '[' | ']' => c,
            _ => '_',
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.');

    let stem = if cleaned.is_empty() { fallback } else { cleaned };
    if stem.to_ascii_lowercase().ends_with(".torrent") {
        stem.to_string()
    } else {
        format!("{}.torrent", stem)
    }
}

/// `Movie.torrent` for attempt 0, then `Movie (1).torrent`, `Movie (2).torrent`...
fn numbered_file_name(file_name: &str, attempt: usize) -> String {
    if attempt == 0 {
        return file_name.to_string();
    }
    let split = file_name.len() - ".torrent".len();
    let (stem, ext) = file_name.split_at(split);
    format!("{} ({}){}", stem, attempt, ext)
}

fn commit_message(batch: &[CatalogEntry]) -> String {
    match batch {
        [entry] => format!("Add {} from Telegram", entry.title),
        entries => format!("Add {} torrents from Telegram", entries.len()),
    }
}
