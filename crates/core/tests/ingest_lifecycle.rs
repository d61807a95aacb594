//! Ingest lifecycle integration tests.
//!
//! These tests drive the ingest processor with a mock Bot API and an
//! in-memory content store:
//! - Magnet links and .torrent attachments ending up in the catalog
//! - Chat allow-list enforcement
//! - Per-item failures (size cap, malformed files)
//! - Processed-attachment cache and catalog write failures

use std::sync::Arc;

use tgcatalog_core::{
    catalog::CatalogService,
    config::CatalogLayout,
    dedup::ProcessedCache,
    ingest::{IngestError, IngestOutcome, IngestProcessor, IngestReport, IngestSettings, ItemErrorCode},
    store::StoreError,
    testing::{fixtures, MockBotApi, MockContentStore},
    CapSeasonPolicy, CatalogError, ContentStore,
};

const CHAT: i64 = -100500;
const CATALOG: &str = "catalog.json";

struct TestHarness {
    processor: IngestProcessor,
    bot: Arc<MockBotApi>,
    store: Arc<MockContentStore>,
    cache: Arc<ProcessedCache>,
}

impl TestHarness {
    fn new() -> Self {
        Self::with(CatalogLayout::Flat, |_| {})
    }

    fn with(layout: CatalogLayout, configure: impl FnOnce(&mut IngestSettings)) -> Self {
        let mut settings = IngestSettings {
            allowed_chat_ids: vec![],
            max_file_size_bytes: 64 * 1024,
            archive_torrents: false,
            torrents_dir: "torrents".to_string(),
            cap_season_policy: CapSeasonPolicy::Hundreds,
        };
        configure(&mut settings);

        let bot = Arc::new(MockBotApi::new());
        let store = Arc::new(MockContentStore::new());
        let cache = Arc::new(ProcessedCache::new(16));
        let catalog = Arc::new(CatalogService::new(
            Arc::clone(&store) as Arc<dyn ContentStore>,
            CATALOG,
            layout,
        ));

        let processor = IngestProcessor::new(
            bot.clone(),
            store.clone(),
            catalog,
            cache.clone(),
            settings,
        );

        Self {
            processor,
            bot,
            store,
            cache,
        }
    }

    async fn report(&self, update: &tgcatalog_core::Update) -> IngestReport {
        match self.processor.handle(update).await.expect("update should succeed") {
            IngestOutcome::Processed(report) => report,
            IngestOutcome::Ignored => panic!("update was ignored"),
        }
    }

    async fn catalog(&self) -> serde_json::Value {
        self.store
            .file_json(CATALOG)
            .await
            .expect("catalog should be written")
    }
}

const HASH_A: &str = "0123456789abcdef0123456789abcdef01234567";
const HASH_B: &str = "89abcdef0123456789abcdef0123456789abcdef";

#[tokio::test]
async fn test_update_without_message_is_ignored() {
    let harness = TestHarness::new();
    let update = tgcatalog_core::Update {
        update_id: 1,
        message: None,
        channel_post: None,
    };

    let outcome = harness.processor.handle(&update).await.unwrap();

    assert_eq!(outcome, IngestOutcome::Ignored);
    assert_eq!(harness.store.write_count().await, 0);
}

#[tokio::test]
async fn test_magnet_in_text_is_added() {
    let harness = TestHarness::new();
    let text = format!(
        "New upload\nmagnet:?xt=urn:btih:{}&dn=Movie.Name.(2020).1080p.BluRay.x264-GROUP&tr=udp%3A%2F%2Ft%3A1",
        HASH_A.to_uppercase()
    );

    let report = harness.report(&fixtures::text_update(1, CHAT, &text)).await;

    assert_eq!(report.added, 1);
    assert_eq!(report.processed.len(), 1);
    assert!(report.processed[0].success);
    assert_eq!(report.processed[0].title.as_deref(), Some("Movie Name"));

    let catalog = harness.catalog().await;
    let entries = catalog.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["type"], "magnet");
    assert_eq!(entries[0]["title"], "Movie Name");
    assert_eq!(entries[0]["year"], "2020");
    assert_eq!(entries[0]["quality"], "1080p");
    assert_eq!(entries[0]["infohash"], HASH_A);
    assert!(entries[0]["source"].as_str().unwrap().starts_with("magnet:?xt=urn:btih:"));
    assert!(entries[0]["added"].is_string());
}

#[tokio::test]
async fn test_magnet_without_name_uses_first_text_line() {
    let harness = TestHarness::new();
    let text = format!("A Great Documentary\nmagnet:?xt=urn:btih:{}", HASH_A);

    let report = harness.report(&fixtures::text_update(1, CHAT, &text)).await;

    assert_eq!(report.processed[0].title.as_deref(), Some("A Great Documentary"));
}

#[tokio::test]
async fn test_several_magnets_written_in_one_commit() {
    let harness = TestHarness::new();
    let text = format!(
        "magnet:?xt=urn:btih:{}&dn=One\nmagnet:?xt=urn:btih:{}&dn=Two",
        HASH_A, HASH_B
    );

    let report = harness.report(&fixtures::text_update(1, CHAT, &text)).await;

    assert_eq!(report.added, 2);
    let writes = harness.store.recorded_writes().await;
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].message, "Add 2 torrents from Telegram");
}

#[tokio::test]
async fn test_torrent_attachment_is_added() {
    let harness = TestHarness::new();
    let torrent = fixtures::sample_torrent("Show.Name.Cap.203.720p.mkv", 734_003_200);
    harness.bot.add_file("BQAC", torrent.clone()).await;

    let update = fixtures::document_update(
        7,
        CHAT,
        "BQAC",
        "Show.Name.Cap.203.720p.torrent",
        Some(torrent.len() as u64),
    );
    let report = harness.report(&update).await;

    assert_eq!(report.added, 1);
    let item = &report.processed[0];
    assert!(item.success);
    assert_eq!(item.source, "Show.Name.Cap.203.720p.torrent");

    let expected = tgcatalog_core::compute_magnet(&torrent).unwrap();
    let catalog = harness.catalog().await;
    let entry = &catalog[0];
    assert_eq!(entry["type"], "magnet");
    assert_eq!(entry["source"], expected.magnet);
    assert_eq!(entry["infohash"], expected.infohash);
    assert_eq!(entry["category"], "series");
    assert_eq!(entry["season"], 2);
    assert_eq!(entry["episode"], 3);
    assert_eq!(entry["quality"], "720p");
    assert_eq!(entry["size_bytes"], 734_003_200u64);
    assert!(entry["title"].as_str().unwrap().contains("Show Name"));

    assert_eq!(harness.bot.downloads().await, vec!["documents/BQAC.torrent"]);
}

#[tokio::test]
async fn test_archived_torrent_references_public_url() {
    let harness = TestHarness::with(CatalogLayout::Flat, |s| s.archive_torrents = true);
    let torrent = fixtures::sample_torrent("Movie.2021.mkv", 1000);
    harness.bot.add_file("F1", torrent.clone()).await;

    let update = fixtures::document_update(1, CHAT, "F1", "Movie 2021 1080p.torrent", None);
    harness.report(&update).await;

    let archived = harness
        .store
        .get_file("torrents/Movie 2021 1080p.torrent")
        .await
        .expect("torrent should be archived");
    assert_eq!(archived.content, torrent);

    let catalog = harness.catalog().await;
    let entry = &catalog[0];
    assert_eq!(entry["type"], "torrent");
    assert_eq!(
        entry["source"],
        "https://raw.example.test/owner/catalog/main/torrents/Movie 2021 1080p.torrent"
    );
    assert!(entry["magnet"].as_str().unwrap().starts_with("magnet:?xt=urn:btih:"));
}

#[tokio::test]
async fn test_same_named_torrents_get_distinct_archive_paths() {
    let harness = TestHarness::with(CatalogLayout::Flat, |s| s.archive_torrents = true);
    let first = fixtures::sample_torrent("Movie.Cut.A.mkv", 1000);
    let second = fixtures::sample_torrent("Movie.Cut.B.mkv", 2000);
    harness.bot.add_file("F1", first.clone()).await;
    harness.bot.add_file("F2", second.clone()).await;

    harness
        .report(&fixtures::document_update(1, CHAT, "F1", "Movie.torrent", None))
        .await;
    let report = harness
        .report(&fixtures::document_update(2, CHAT, "F2", "Movie.torrent", None))
        .await;
    assert_eq!(report.added, 1);

    let kept = harness.store.get_file("torrents/Movie.torrent").await.unwrap();
    assert_eq!(kept.content, first);
    let renamed = harness
        .store
        .get_file("torrents/Movie (1).torrent")
        .await
        .expect("second torrent archived under a numbered name");
    assert_eq!(renamed.content, second);

    let catalog = harness.catalog().await;
    let entries = catalog.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries[1]["source"],
        "https://raw.example.test/owner/catalog/main/torrents/Movie (1).torrent"
    );
    assert_ne!(entries[0]["infohash"], entries[1]["infohash"]);
}

#[tokio::test]
async fn test_rearchiving_identical_torrent_reuses_path() {
    let harness = TestHarness::with(CatalogLayout::Flat, |s| s.archive_torrents = true);
    let torrent = fixtures::sample_torrent("Movie.mkv", 1000);
    harness.bot.add_file("F1", torrent.clone()).await;
    harness.bot.add_file("F2", torrent).await;

    harness
        .report(&fixtures::document_update(1, CHAT, "F1", "Movie.torrent", None))
        .await;
    harness
        .report(&fixtures::document_update(2, CHAT, "F2", "Movie.torrent", None))
        .await;

    assert!(harness.store.get_file("torrents/Movie (1).torrent").await.is_none());
    assert_eq!(harness.catalog().await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_archive_failure_is_per_item() {
    let harness = TestHarness::with(CatalogLayout::Flat, |s| s.archive_torrents = true);
    harness
        .bot
        .add_file("F1", fixtures::sample_torrent("Movie.mkv", 10))
        .await;
    harness
        .store
        .fail_next_read(StoreError::Unauthorized("bad token".into()))
        .await;

    let update = fixtures::document_update(1, CHAT, "F1", "Movie.torrent", None);
    let report = harness.report(&update).await;

    assert_eq!(report.added, 0);
    assert_eq!(
        report.processed[0].error_code,
        Some(ItemErrorCode::ArchiveFailed)
    );
    assert!(harness.store.get_file(CATALOG).await.is_none());
}

#[tokio::test]
async fn test_disallowed_chat_rejected_before_side_effects() {
    let harness = TestHarness::with(CatalogLayout::Flat, |s| s.allowed_chat_ids = vec![42]);
    harness
        .bot
        .add_file("F1", fixtures::sample_torrent("Movie.mkv", 10))
        .await;

    let update = fixtures::document_update(1, CHAT, "F1", "Movie.torrent", None);
    let result = harness.processor.handle(&update).await;

    assert!(matches!(result, Err(IngestError::ChatNotAllowed(CHAT))));
    assert!(harness.bot.get_file_calls().await.is_empty());
    assert_eq!(harness.store.write_count().await, 0);
    assert!(harness.cache.is_empty());
}

#[tokio::test]
async fn test_declared_oversize_never_downloaded() {
    let harness = TestHarness::with(CatalogLayout::Flat, |s| s.max_file_size_bytes = 100);

    let update = fixtures::document_update(1, CHAT, "BIG", "Big.torrent", Some(5_000_000));
    let report = harness.report(&update).await;

    assert_eq!(report.added, 0);
    assert!(report.all_failed_with(ItemErrorCode::FileTooLarge));
    assert!(harness.bot.get_file_calls().await.is_empty());
    assert!(harness.bot.downloads().await.is_empty());
    assert_eq!(harness.store.write_count().await, 0);
}

#[tokio::test]
async fn test_undeclared_oversize_rejected_by_download_cap() {
    let harness = TestHarness::with(CatalogLayout::Flat, |s| s.max_file_size_bytes = 100);
    harness
        .bot
        .add_file_with_declared_size("BIG", vec![b'x'; 500], None)
        .await;

    let update = fixtures::document_update(1, CHAT, "BIG", "Big.torrent", None);
    let report = harness.report(&update).await;

    assert!(report.all_failed_with(ItemErrorCode::FileTooLarge));
    assert_eq!(harness.store.write_count().await, 0);
    // failed attachments may be retried
    assert!(harness.processor.handle(&update).await.is_ok());
    assert_eq!(harness.bot.get_file_calls().await.len(), 2);
}

#[tokio::test]
async fn test_malformed_torrent_does_not_block_magnets() {
    let harness = TestHarness::new();
    harness.bot.add_file("BAD", b"not bencode".to_vec()).await;

    let mut update = fixtures::document_update(1, CHAT, "BAD", "Broken.torrent", None);
    if let Some(post) = update.channel_post.as_mut() {
        post.caption = Some(format!("magnet:?xt=urn:btih:{}&dn=Fine.Movie.2019", HASH_B));
    }
    let report = harness.report(&update).await;

    assert_eq!(report.added, 1);
    assert_eq!(report.processed.len(), 2);
    let failed = report.processed.iter().find(|i| !i.success).unwrap();
    assert_eq!(failed.error_code, Some(ItemErrorCode::MalformedTorrent));

    let catalog = harness.catalog().await;
    assert_eq!(catalog.as_array().unwrap().len(), 1);
    assert_eq!(catalog[0]["title"], "Fine Movie");
}

#[tokio::test]
async fn test_redelivered_attachment_is_skipped() {
    let harness = TestHarness::new();
    harness
        .bot
        .add_file("F1", fixtures::sample_torrent("Movie.mkv", 10))
        .await;
    let update = fixtures::document_update(1, CHAT, "F1", "Movie.torrent", None);

    let first = harness.report(&update).await;
    let second = harness.report(&update).await;

    assert_eq!(first.added, 1);
    assert_eq!(second.added, 0);
    assert_eq!(second.skipped, 1);
    assert!(second.processed.is_empty());
    assert_eq!(harness.bot.get_file_calls().await.len(), 1);
    assert_eq!(harness.store.write_count().await, 1);
}

#[tokio::test]
async fn test_repeated_source_keeps_single_entry() {
    let harness = TestHarness::new();
    let first = format!("magnet:?xt=urn:btih:{}&dn=Old.Name.2000", HASH_A);

    harness.report(&fixtures::text_update(1, CHAT, &first)).await;
    harness.report(&fixtures::text_update(2, CHAT, &first)).await;

    let catalog = harness.catalog().await;
    assert_eq!(catalog.as_array().unwrap().len(), 1);
    assert_eq!(harness.store.write_count().await, 2);
}

#[tokio::test]
async fn test_storage_failure_surfaces_and_allows_retry() {
    let harness = TestHarness::new();
    harness
        .bot
        .add_file("F1", fixtures::sample_torrent("Movie.mkv", 10))
        .await;
    harness
        .store
        .fail_next_write(StoreError::ApiError("HTTP 502".into()))
        .await;
    let update = fixtures::document_update(1, CHAT, "F1", "Movie.torrent", None);

    let result = harness.processor.handle(&update).await;
    assert!(matches!(
        result,
        Err(IngestError::Storage(CatalogError::Storage(_)))
    ));
    assert!(harness.store.get_file(CATALOG).await.is_none());

    // the attachment was forgotten, so the redelivery is processed
    let report = harness.report(&update).await;
    assert_eq!(report.added, 1);
}

#[tokio::test]
async fn test_nested_layout_groups_releases() {
    let harness = TestHarness::with(CatalogLayout::Nested, |_| {});
    let text = format!(
        "magnet:?xt=urn:btih:{}&dn=Movie.Name.2020.1080p\nmagnet:?xt=urn:btih:{}&dn=Movie.Name.2020.720p",
        HASH_A, HASH_B
    );

    harness.report(&fixtures::text_update(1, CHAT, &text)).await;

    let catalog = harness.catalog().await;
    let group = &catalog["movie"]["movie name||2020"];
    assert_eq!(group["title"], "Movie Name");
    assert_eq!(group["torrents"].as_array().unwrap().len(), 2);
    assert_eq!(catalog["series"], serde_json::json!({}));
}
