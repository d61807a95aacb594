use serde::Serialize;
use thiserror::Error;

use crate::catalog::CatalogError;

/// Where a catalog item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Torrent,
    Magnet,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Torrent => "torrent",
            ItemKind::Magnet => "magnet",
        }
    }
}

/// Why a single item was not added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemErrorCode {
    FileTooLarge,
    MalformedTorrent,
    DownloadFailed,
    ArchiveFailed,
    InvalidMagnet,
}

impl ItemErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemErrorCode::FileTooLarge => "file_too_large",
            ItemErrorCode::MalformedTorrent => "malformed_torrent",
            ItemErrorCode::DownloadFailed => "download_failed",
            ItemErrorCode::ArchiveFailed => "archive_failed",
            ItemErrorCode::InvalidMagnet => "invalid_magnet",
        }
    }
}

/// Per-item failure carried in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub code: ItemErrorCode,
    pub message: String,
}

impl ItemFailure {
    pub fn new(code: ItemErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Result for one magnet link or attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub kind: ItemKind,
    /// Attachment file name or the magnet URI.
    pub source: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infohash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ItemErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemOutcome {
    pub fn succeeded(
        kind: ItemKind,
        source: impl Into<String>,
        title: impl Into<String>,
        infohash: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            source: source.into(),
            success: true,
            title: Some(title.into()),
            infohash: Some(infohash.into()),
            error_code: None,
            error: None,
        }
    }

    pub fn failed(kind: ItemKind, source: impl Into<String>, failure: ItemFailure) -> Self {
        Self {
            kind,
            source: source.into(),
            success: false,
            title: None,
            infohash: None,
            error_code: Some(failure.code),
            error: Some(failure.message),
        }
    }
}

/// Summary of a processed update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Entries inserted or updated in the catalog.
    pub added: usize,
    pub processed: Vec<ItemOutcome>,
    /// Attachments skipped because they were handled recently.
    #[serde(skip_serializing_if = "is_zero")]
    pub skipped: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl IngestReport {
    /// True when at least one item was attempted and every item failed
    /// with `code`.
    pub fn all_failed_with(&self, code: ItemErrorCode) -> bool {
        !self.processed.is_empty()
            && self
                .processed
                .iter()
                .all(|item| !item.success && item.error_code == Some(code))
    }

    pub fn succeeded(&self) -> usize {
        self.processed.iter().filter(|item| item.success).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The update carried no message or channel post.
    Ignored,
    Processed(IngestReport),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Chat {0} is not allowed")]
    ChatNotAllowed(i64),

    #[error("Failed to save catalog: {0}")]
    Storage(#[from] CatalogError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn too_large(source: &str) -> ItemOutcome {
        ItemOutcome::failed(
            ItemKind::Torrent,
            source,
            ItemFailure::new(ItemErrorCode::FileTooLarge, "too big"),
        )
    }

    #[test]
    fn test_all_failed_with() {
        let mut report = IngestReport::default();
        assert!(!report.all_failed_with(ItemErrorCode::FileTooLarge));

        report.processed.push(too_large("a.torrent"));
        assert!(report.all_failed_with(ItemErrorCode::FileTooLarge));

        report.processed.push(ItemOutcome::succeeded(
            ItemKind::Magnet,
            "magnet:?xt=urn:btih:aa",
            "X",
            "aa",
        ));
        assert!(!report.all_failed_with(ItemErrorCode::FileTooLarge));
        assert_eq!(report.succeeded(), 1);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(too_large("big.torrent")).unwrap();
        assert_eq!(json["kind"], "torrent");
        assert_eq!(json["success"], false);
        assert_eq!(json["error_code"], "file_too_large");
        assert!(json.get("title").is_none());

        let report = IngestReport {
            added: 0,
            processed: vec![],
            skipped: 0,
        };
        let json = serde_json::to_value(report).unwrap();
        assert!(json.get("skipped").is_none());
    }

    #[test]
    fn test_error_code_strings_match_serde() {
        for code in [
            ItemErrorCode::FileTooLarge,
            ItemErrorCode::MalformedTorrent,
            ItemErrorCode::DownloadFailed,
            ItemErrorCode::ArchiveFailed,
            ItemErrorCode::InvalidMagnet,
        ] {
            assert_eq!(serde_json::to_value(code).unwrap(), code.as_str());
        }
    }
}
