mod request_id;

use crate::catalog::PromptCatalog;
use crate::config::AppConfig;
use crate::error::ProxyError;
use crate::routing::ModelResolver;
use crate::stream::ReasoningMode;
use crate::transport::HttpTransport;

use request_id::RequestIdGenerator;

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub config: AppConfig,
    pub catalog: PromptCatalog,
    pub resolver: ModelResolver,
    pub transport: HttpTransport,
    request_ids: RequestIdGenerator,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: AppConfig,
        catalog: PromptCatalog,
        resolver: ModelResolver,
        transport: HttpTransport,
    ) -> Self {
        Self {
            config,
            catalog,
            resolver,
            transport,
            request_ids: RequestIdGenerator::new(),
        }
    }

    /// Build every component from a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] when the HTTP transport cannot be built.
    pub fn from_config(config: AppConfig) -> Result<Self, ProxyError> {
        let catalog = PromptCatalog::from_config(&config);
        let resolver = ModelResolver::new(&config);
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(config, catalog, resolver, transport))
    }

    #[must_use]
    pub fn reasoning_mode(&self) -> ReasoningMode {
        ReasoningMode::from_show_reasoning(self.config.features.show_reasoning)
    }

    pub fn next_completion_id(&self) -> String {
        self.request_ids.completion_id(self.request_ids.next_seq())
    }
}
