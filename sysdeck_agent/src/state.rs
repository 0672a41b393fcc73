//! Shared agent state: the host backend and the optional access token.

use std::sync::Arc;
use std::time::Duration;

use sysdeck::config::Config;
use sysdeck::providers::{Backend, BackendSettings, SystemBackend};

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub fetch_timeout: Duration,
    // when set, every request must carry ?token=<value>
    pub auth_token: Option<String>,
}

impl AppState {
    pub fn new(backend: Arc<dyn Backend>, fetch_timeout: Duration) -> Self {
        Self {
            backend,
            fetch_timeout,
            auth_token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token.filter(|t| !t.is_empty());
        self
    }

    /// Host backend configured from the console's config file.
    pub fn from_config(cfg: &Config) -> Self {
        let backend = Arc::new(SystemBackend::new(BackendSettings::from(cfg)));
        Self::new(backend, cfg.fetch_timeout())
            .with_token(std::env::var("SYSDECK_AGENT_TOKEN").ok())
    }
}
