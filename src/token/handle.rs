use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::cache::token::TokenState;
use crate::cache::token_store::TokenStore;
use crate::config::connection::ConnectionConfig;
use crate::config::settings::LifecycleSettings;
use crate::error::TokenError;
use crate::manager::{LifecycleState, TokenLifecycle};
use crate::sources::TokenSource;
use crate::token::builder::TokenBuilder;

/// Application facing handle to a self-refreshing access token.
///
/// A handle only exists once the first token was fetched. Dropping it stops
/// the background refresh.
#[derive(Debug)]
pub struct TokenHandle {
    store: Arc<TokenStore>,
    state: watch::Receiver<LifecycleState>,
    shutdown: CancellationToken,
    refresh_task: Option<JoinHandle<()>>,
}

impl TokenHandle {
    pub fn builder<S: TokenSource>() -> TokenBuilder<S> {
        TokenBuilder::new()
    }

    /// Validate `connection`, fetch the first token within the fetch deadline
    /// and start the refresh loop.
    ///
    /// Fails without touching the network when a required field is missing
    /// or a lifecycle timing is unusable.
    pub async fn construct<S: TokenSource>(
        connection: ConnectionConfig,
        settings: LifecycleSettings,
        source: Arc<S>,
    ) -> Result<Self, TokenError> {
        let params = connection.validate().inspect_err(|e| error!("{}", e))?;
        settings.validate().inspect_err(|e| error!("{}", e))?;

        let store = Arc::new(TokenStore::new());
        let lifecycle = TokenLifecycle::new(source, params, settings, store.clone());
        let state = lifecycle.subscribe();

        let initial = lifecycle.acquire().await?;

        let shutdown = CancellationToken::new();
        let refresh_task = lifecycle.spawn_refresh(initial.expiration_seconds, shutdown.clone());

        Ok(Self {
            store,
            state,
            shutdown,
            refresh_task: Some(refresh_task),
        })
    }

    /// Current token string. Never waits on the network.
    pub fn get(&self) -> Result<String, TokenError> {
        self.store.read().ok_or(TokenError::NotInitialized)
    }

    /// Current token with its metadata.
    pub fn snapshot(&self) -> Option<Arc<TokenState>> {
        self.store.snapshot()
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Signal the refresh loop to stop without waiting for it.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Stop the refresh loop and wait until it has exited.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.refresh_task.take() {
            if let Err(e) = task.await {
                warn!("token refresh task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for TokenHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
