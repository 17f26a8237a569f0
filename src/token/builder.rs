use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use crate::config::connection::ConnectionConfig;
use crate::config::settings::LifecycleSettings;
use crate::config::types::ServiceConfig;
use crate::error::TokenError;
use crate::sources::TokenSource;
use crate::token::handle::TokenHandle;

/// Fluent construction of a [`TokenHandle`].
///
/// Setters only record values; nothing is validated or fetched until
/// [`TokenBuilder::build`].
#[derive(Debug)]
pub struct TokenBuilder<S> {
    connection: ConnectionConfig,
    settings: LifecycleSettings,
    source: Option<Arc<S>>,
}

impl<S: TokenSource> Default for TokenBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TokenSource> TokenBuilder<S> {
    pub fn new() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            settings: LifecycleSettings::default(),
            source: None,
        }
    }

    /// Start from a loaded service config.
    pub fn from_service_config(cfg: &ServiceConfig) -> Self {
        Self {
            connection: cfg.connection.clone(),
            settings: cfg.settings.lifecycle(),
            source: None,
        }
    }

    pub fn scheme(mut self, v: impl Into<String>) -> Self {
        self.connection.scheme = Some(v.into());
        self
    }

    pub fn server(mut self, v: impl Into<String>) -> Self {
        self.connection.server = Some(v.into());
        self
    }

    pub fn port(mut self, v: u16) -> Self {
        self.connection.port = Some(v);
        self
    }

    pub fn realm(mut self, v: impl Into<String>) -> Self {
        self.connection.realm = Some(v.into());
        self
    }

    pub fn client_id(mut self, v: impl Into<String>) -> Self {
        self.connection.client_id = Some(v.into());
        self
    }

    pub fn client_secret(mut self, v: impl Into<String>) -> Self {
        self.connection.client_secret = Some(v.into());
        self
    }

    pub fn token_source(mut self, source: S) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn shared_token_source(mut self, source: Arc<S>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn settings(mut self, settings: LifecycleSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn safety_margin(mut self, v: Duration) -> Self {
        self.settings.safety_margin = v;
        self
    }

    pub fn fetch_timeout(mut self, v: Duration) -> Self {
        self.settings.fetch_timeout = v;
        self
    }

    pub fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.settings.initial_backoff = initial;
        self.settings.max_backoff = max;
        self
    }

    /// Validate everything at once, then run the first fetch.
    pub async fn build(self) -> Result<TokenHandle, TokenError> {
        let mut missing = self.connection.missing_fields();
        let source = match self.source {
            Some(source) if missing.is_empty() => source,
            source => {
                if source.is_none() {
                    missing.push("token_source");
                }
                let e = TokenError::MissingFields(missing);
                error!("{}", e);
                return Err(e);
            }
        };

        TokenHandle::construct(self.connection, self.settings, source).await
    }
}
