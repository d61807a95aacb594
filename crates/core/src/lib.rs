pub mod auth;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod dedup;
pub mod ingest;
pub mod journal;
pub mod metrics;
pub mod store;
pub mod telegram;
pub mod testing;
pub mod torrent;

pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, Identity, NoneAuthenticator,
    SecretTokenAuthenticator, SECRET_TOKEN_HEADER,
};
pub use catalog::{
    CatalogDocument, CatalogEntry, CatalogError, CatalogService, EntryKind, MergeSummary,
};
pub use classifier::{classify, CapSeasonPolicy, Category, Quality, TorrentMetadata};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, CatalogLayout, Config,
    ConfigError, DebugConfig, SanitizedConfig,
};
pub use dedup::ProcessedCache;
pub use ingest::{
    IngestError, IngestOutcome, IngestProcessor, IngestReport, IngestSettings, ItemErrorCode,
    ItemOutcome,
};
pub use journal::{JournalEntry, UpdateJournal};
pub use store::{ContentStore, GitHubContentStore, StoreError, StoredFile};
pub use telegram::{BotApi, TelegramClient, TelegramError, Update};
pub use torrent::{build_magnet, compute_magnet, MagnetRecord, TorrentError};
