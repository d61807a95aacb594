use std::sync::Arc;
use tgcatalog_core::{
    Authenticator, CatalogService, Config, IngestProcessor, SanitizedConfig, UpdateJournal,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    processor: Arc<IngestProcessor>,
    journal: UpdateJournal,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        processor: Arc<IngestProcessor>,
    ) -> Self {
        let journal = UpdateJournal::new(config.debug.journal_capacity);
        Self {
            config,
            authenticator,
            processor,
            journal,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn processor(&self) -> &IngestProcessor {
        self.processor.as_ref()
    }

    pub fn journal(&self) -> &UpdateJournal {
        &self.journal
    }

    pub fn catalog(&self) -> &CatalogService {
        self.processor.catalog()
    }
}
