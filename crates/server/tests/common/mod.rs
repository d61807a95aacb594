//! Common test utilities for in-process server tests with mocks.
//!
//! The fixture builds the real router with a mock Bot API and an in-memory
//! content store injected, so webhook deliveries can be exercised without
//! Telegram or GitHub.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use tgcatalog_core::{
    create_authenticator, load_config_from_str, AuthMethod, CatalogLayout, CatalogService,
    Config, IngestProcessor, IngestSettings, ProcessedCache, SECRET_TOKEN_HEADER,
    testing::{MockBotApi, MockContentStore},
};

/// Re-export fixtures for test convenience
pub use tgcatalog_core::testing::fixtures;

/// Chat id allowed by the default test configuration.
pub const ALLOWED_CHAT: i64 = -1001234;

const BASE_CONFIG: &str = r#"
[auth]
method = "none"

[telegram]
bot_token = "123456:test-token"

[github]
repo = "owner/catalog"
token = "ghp_test"
"#;

/// Test fixture for the HTTP surface.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_magnet_post() {
///     let fixture = TestFixture::new().await;
///     let update = fixtures::text_update(1, ALLOWED_CHAT, "magnet:?xt=urn:btih:abc");
///
///     let response = fixture.post_update(&update).await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock Bot API - register downloadable attachments
    pub bot: Arc<MockBotApi>,
    /// In-memory repository - inspect catalog writes
    pub store: Arc<MockContentStore>,
    pub config: Config,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let bot = Arc::new(MockBotApi::new());
        let store = Arc::new(MockContentStore::new());

        let mut config = load_config_from_str(BASE_CONFIG).expect("base config parses");
        config.telegram.allowed_chat_ids = vec![ALLOWED_CHAT];
        config.telegram.max_file_size_bytes = test_config.max_file_size_bytes;
        config.github.archive_torrents = test_config.archive_torrents;
        config.catalog.layout = test_config.layout;
        config.debug.journal_capacity = test_config.journal_capacity;
        if let Some(secret) = test_config.secret_token {
            config.auth.method = AuthMethod::SecretToken;
            config.auth.secret_token = Some(secret);
        }

        let authenticator: Arc<dyn tgcatalog_core::Authenticator> =
            Arc::from(create_authenticator(&config.auth).expect("authenticator from config"));

        let catalog = Arc::new(CatalogService::new(
            Arc::clone(&store) as Arc<dyn tgcatalog_core::ContentStore>,
            config.github.catalog_path.clone(),
            config.catalog.layout,
        ));
        let processor = Arc::new(IngestProcessor::new(
            Arc::clone(&bot) as Arc<dyn tgcatalog_core::BotApi>,
            Arc::clone(&store) as Arc<dyn tgcatalog_core::ContentStore>,
            catalog,
            Arc::new(ProcessedCache::new(config.dedup.capacity)),
            IngestSettings::from_config(&config),
        ));

        let state = Arc::new(tgcatalog_server::state::AppState::new(
            config.clone(),
            authenticator,
            processor,
        ));
        let router = tgcatalog_server::api::create_router(state);

        Self {
            router,
            bot,
            store,
            config,
        }
    }

    pub fn catalog_path(&self) -> &str {
        &self.config.github.catalog_path
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, &[]).await
    }

    /// Send a GET request with the webhook secret header set.
    pub async fn get_with_secret(&self, path: &str, secret: &str) -> TestResponse {
        self.request("GET", path, None, &[(SECRET_TOKEN_HEADER, secret)])
            .await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        let bytes = serde_json::to_vec(&body).unwrap();
        self.request("POST", path, Some(bytes), &[]).await
    }

    /// Deliver an update to the webhook.
    pub async fn post_update(&self, update: &tgcatalog_core::Update) -> TestResponse {
        self.post("/api/webhook", serde_json::to_value(update).unwrap())
            .await
    }

    /// Deliver an update with the webhook secret header set.
    pub async fn post_update_with_secret(
        &self,
        update: &tgcatalog_core::Update,
        secret: &str,
    ) -> TestResponse {
        let bytes = serde_json::to_vec(update).unwrap();
        self.request(
            "POST",
            "/api/webhook",
            Some(bytes),
            &[(SECRET_TOKEN_HEADER, secret)],
        )
        .await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request("POST", path, Some(body.as_bytes().to_vec()), &[])
            .await
    }

    /// Fetch `/metrics` as plain text.
    pub async fn metrics_text(&self) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Vec<u8>>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            request_builder = request_builder.header(*name, *value);
        }

        let body = match body {
            Some(bytes) => {
                request_builder = request_builder.header("Content-Type", "application/json");
                Body::from(bytes)
            }
            None => Body::empty(),
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub layout: CatalogLayout,
    pub max_file_size_bytes: u64,
    pub archive_torrents: bool,
    /// Enables secret token auth on the webhook
    pub secret_token: Option<String>,
    pub journal_capacity: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            layout: CatalogLayout::Flat,
            max_file_size_bytes: 64 * 1024,
            archive_torrents: false,
            secret_token: None,
            journal_capacity: 50,
        }
    }
}

impl TestConfig {
    pub fn nested() -> Self {
        Self {
            layout: CatalogLayout::Nested,
            ..Default::default()
        }
    }

    pub fn with_secret(secret: &str) -> Self {
        Self {
            secret_token: Some(secret.to_string()),
            ..Default::default()
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
