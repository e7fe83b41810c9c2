//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::config::{AssistantConfig, ConfigResult};
use crate::generation::GenerationClient;
use crate::session::SessionStore;

/// Shared application state.
pub struct AppState {
    /// Generation client with the selected backend.
    pub generation: GenerationClient,
    /// Per-user session state.
    pub sessions: Arc<SessionStore>,
    /// Effective configuration.
    pub config: AssistantConfig,
}

impl AppState {
    /// Create the application state, selecting the generation backend.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or no backend can be built.
    pub fn new(config: AssistantConfig) -> ConfigResult<Arc<Self>> {
        config.validate()?;
        let generation = GenerationClient::from_config(&config.gemini)?;
        Ok(Self::with_client(config, generation))
    }

    /// Create the state around an existing generation client.
    #[must_use]
    pub fn with_client(config: AssistantConfig, generation: GenerationClient) -> Arc<Self> {
        let sessions = Arc::new(SessionStore::new(config.session.clone()));
        Arc::new(Self {
            generation,
            sessions,
            config,
        })
    }
}
