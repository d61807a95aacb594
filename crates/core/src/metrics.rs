//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Webhook ingest (updates, attachments, magnets)
//! - Catalog writes
//! - External services (Telegram Bot API, GitHub contents API)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Ingest
// =============================================================================

/// Webhook updates by outcome.
pub static UPDATES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tgcatalog_updates_total", "Total webhook updates handled"),
        &["outcome"], // "ignored", "rejected", "processed", "failed"
    )
    .unwrap()
});

/// Catalog items by source kind and result.
pub static INGEST_ITEMS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tgcatalog_ingest_items_total",
            "Attachments and magnet links processed",
        ),
        &["kind", "result"], // kind: "torrent", "magnet"; result: "ok" or an error code
    )
    .unwrap()
});

/// Attachments skipped because their file id was seen recently.
pub static DUPLICATE_ATTACHMENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tgcatalog_duplicate_attachments_total",
        "Attachments skipped by the processed-file cache",
    )
    .unwrap()
});

/// Size of downloaded .torrent files.
pub static TORRENT_DOWNLOAD_BYTES: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tgcatalog_torrent_download_bytes",
            "Size of downloaded torrent files",
        )
        .buckets(vec![
            1024.0, 8192.0, 32768.0, 131072.0, 524288.0, 2097152.0, 10485760.0,
        ]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Catalog
// =============================================================================

/// Catalog write attempts by result.
pub static CATALOG_WRITES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tgcatalog_catalog_writes_total", "Catalog write attempts"),
        &["result"], // "success", "conflict", "failed"
    )
    .unwrap()
});

/// Entries inserted or updated by catalog merges.
pub static CATALOG_ENTRIES_MERGED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tgcatalog_catalog_entries_merged_total",
            "Entries merged into the catalog",
        ),
        &["action"], // "inserted", "updated"
    )
    .unwrap()
});

// =============================================================================
// External Services
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tgcatalog_external_service_duration_seconds",
            "External service request duration",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service", "operation"],
    )
    .unwrap()
});

/// External service requests by result.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tgcatalog_external_service_requests_total",
            "External service requests",
        ),
        &["service", "operation", "result"], // result: "success", "error"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Ingest
        Box::new(UPDATES_TOTAL.clone()),
        Box::new(INGEST_ITEMS_TOTAL.clone()),
        Box::new(DUPLICATE_ATTACHMENTS.clone()),
        Box::new(TORRENT_DOWNLOAD_BYTES.clone()),
        // Catalog
        Box::new(CATALOG_WRITES_TOTAL.clone()),
        Box::new(CATALOG_ENTRIES_MERGED.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
    ]
}
