//! Read-merge-write cycle against the content store.

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::CatalogLayout;
use crate::metrics;
use crate::store::ContentStore;

use super::{CatalogDocument, CatalogEntry, CatalogError, MergeSummary};

/// A catalog together with the revision it was read at.
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub document: CatalogDocument,
    /// `None` when the file does not exist or could not be read.
    pub revision: Option<String>,
}

/// Loads and persists the catalog document at one path of a store.
pub struct CatalogService {
    store: Arc<dyn ContentStore>,
    path: String,
    layout: CatalogLayout,
}

impl CatalogService {
    pub fn new(store: Arc<dyn ContentStore>, path: impl Into<String>, layout: CatalogLayout) -> Self {
        Self {
            store,
            path: path.into(),
            layout,
        }
    }

    pub fn layout(&self) -> CatalogLayout {
        self.layout
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Load the catalog. Never fails: a missing, unreadable or unparsable
    /// document loads as empty.
    pub async fn load(&self) -> LoadedCatalog {
        let stored = match self.store.read(&self.path).await {
            Ok(Some(file)) => file,
            Ok(None) => {
                info!(path = %self.path, "Catalog not found, starting empty");
                return LoadedCatalog {
                    document: CatalogDocument::empty(self.layout),
                    revision: None,
                };
            }
            Err(e) => {
                warn!(path = %self.path, error = %e, "Failed to read catalog, starting empty");
                return LoadedCatalog {
                    document: CatalogDocument::empty(self.layout),
                    revision: None,
                };
            }
        };

        let document = match CatalogDocument::parse(self.layout, &stored.content) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %self.path, error = %e, "Failed to parse catalog, starting empty");
                CatalogDocument::empty(self.layout)
            }
        };

        LoadedCatalog {
            document,
            revision: Some(stored.revision),
        }
    }

    /// The stored document as JSON, or the empty document of the configured
    /// layout when it cannot be read.
    pub async fn load_raw(&self) -> serde_json::Value {
        match self.store.read(&self.path).await {
            Ok(Some(file)) => match serde_json::from_slice(&file.content) {
                Ok(value) => value,
                Err(e) => {
                    warn!(path = %self.path, error = %e, "Stored catalog is not valid JSON");
                    CatalogDocument::empty_json(self.layout)
                }
            },
            Ok(None) => CatalogDocument::empty_json(self.layout),
            Err(e) => {
                warn!(path = %self.path, error = %e, "Failed to read catalog");
                CatalogDocument::empty_json(self.layout)
            }
        }
    }

    /// Merge `batch` into the stored catalog and write the full document
    /// back with the revision obtained by the preceding read.
    pub async fn merge_and_save(
        &self,
        batch: &[CatalogEntry],
        message: &str,
    ) -> Result<MergeSummary, CatalogError> {
        let LoadedCatalog {
            mut document,
            revision,
        } = self.load().await;

        let summary = document.merge(batch);
        let bytes = document.to_json_pretty()?;

        match self
            .store
            .write(&self.path, &bytes, message, revision.as_deref())
            .await
        {
            Ok(new_revision) => {
                metrics::CATALOG_WRITES_TOTAL
                    .with_label_values(&["success"])
                    .inc();
                metrics::CATALOG_ENTRIES_MERGED
                    .with_label_values(&["inserted"])
                    .inc_by(summary.inserted as u64);
                metrics::CATALOG_ENTRIES_MERGED
                    .with_label_values(&["updated"])
                    .inc_by(summary.updated as u64);
                info!(
                    path = %self.path,
                    revision = %new_revision,
                    inserted = summary.inserted,
                    updated = summary.updated,
                    entries = document.len(),
                    "Catalog saved"
                );
                Ok(summary)
            }
            Err(e) => {
                let err = CatalogError::from(e);
                let result = match err {
                    CatalogError::Conflict(_) => "conflict",
                    _ => "failed",
                };
                metrics::CATALOG_WRITES_TOTAL
                    .with_label_values(&[result])
                    .inc();
                warn!(path = %self.path, error = %err, "Catalog write failed");
                Err(err)
            }
        }
    }
}
