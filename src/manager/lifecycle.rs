use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cache::token::TokenState;
use crate::cache::token_store::TokenStore;
use crate::config::connection::ConnectionParams;
use crate::config::settings::LifecycleSettings;
use crate::error::{FetchError, TokenError};
use crate::manager::schedule::{next_delay, LastAttempt, LifecycleState};
use crate::observability::metrics::{get_metrics, PHASE_INITIAL, PHASE_REFRESH};
use crate::resilience::retry::Backoff;
use crate::sources::{TokenPayload, TokenSource};

static TIMEOUT_MSG: &str = "timeout";

/// Why a single fetch attempt produced no token.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no response within {0:?}")]
    Deadline(Duration),
}

impl AttemptError {
    fn reason(&self) -> &'static str {
        match self {
            AttemptError::Fetch(e) => e.reason(),
            AttemptError::Deadline(_) => TIMEOUT_MSG,
        }
    }
}

impl From<AttemptError> for TokenError {
    fn from(e: AttemptError) -> Self {
        match e {
            AttemptError::Fetch(e) => TokenError::InitialFetch(e),
            AttemptError::Deadline(d) => TokenError::DeadlineExceeded(d),
        }
    }
}

/// Drives token acquisition and the background refresh loop.
///
/// It is the only writer of its [`TokenStore`]: first on the construction
/// path, then from the refresh task, never from both at once.
pub struct TokenLifecycle<S> {
    source: Arc<S>,
    params: ConnectionParams,
    settings: LifecycleSettings,
    store: Arc<TokenStore>,
    state: watch::Sender<LifecycleState>,
}

impl<S: TokenSource> TokenLifecycle<S> {
    pub fn new(
        source: Arc<S>,
        params: ConnectionParams,
        settings: LifecycleSettings,
        store: Arc<TokenStore>,
    ) -> Self {
        let (state, _) = watch::channel(LifecycleState::Uninitialized);
        Self {
            source,
            params,
            settings,
            store,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    fn transition(&self, next: LifecycleState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!("token lifecycle {} -> {}", prev, next);
        }
    }

    /// One fetch raced against the deadline. A result arriving later is dropped
    /// together with the fetch future and never reaches the store.
    async fn fetch_once(&self, phase: &'static str) -> Result<TokenPayload, AttemptError> {
        let metrics = get_metrics().await;
        let start = Instant::now();
        metrics.token_fetch_requests.with_label_values(&[phase]).inc();

        let result = match tokio::time::timeout(
            self.settings.fetch_timeout,
            self.source.fetch_token(&self.params),
        )
        .await
        {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(e)) => Err(AttemptError::Fetch(e)),
            Err(_) => Err(AttemptError::Deadline(self.settings.fetch_timeout)),
        };

        metrics
            .token_fetch_duration
            .with_label_values(&[phase])
            .observe(start.elapsed().as_secs_f64());
        if let Err(e) = &result {
            metrics
                .token_fetch_failures
                .with_label_values(&[phase, e.reason()])
                .inc();
        }
        result
    }

    async fn store_payload(&self, payload: TokenPayload) -> Arc<TokenState> {
        let state = self.store.write(payload.token, payload.expiration_seconds);
        let metrics = get_metrics().await;
        metrics.token_expiration_seconds.set(state.expiration_seconds as i64);
        metrics.token_last_updated_unix.set(state.last_updated.timestamp());
        state
    }

    /// Initial synchronous acquisition. Any failure here is fatal.
    pub async fn acquire(&self) -> Result<Arc<TokenState>, TokenError> {
        self.transition(LifecycleState::Acquiring);
        info!(
            "requesting first token for client '{}' in realm '{}'",
            self.params.client_id, self.params.realm
        );

        match self.fetch_once(PHASE_INITIAL).await {
            Ok(payload) => {
                let state = self.store_payload(payload).await;
                self.transition(LifecycleState::Ready);
                info!("retrieved first token, expires in {} seconds", state.expiration_seconds);
                Ok(state)
            }
            Err(e) => {
                self.transition(LifecycleState::FailedFatal);
                error!("error while receiving the first token: {}", e);
                Err(e.into())
            }
        }
    }

    /// Start the refresh loop after a successful [`TokenLifecycle::acquire`].
    pub fn spawn_refresh(
        self,
        expiration_seconds: u64,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move { self.refresh_loop(expiration_seconds, shutdown).await })
    }

    async fn refresh_loop(self, expiration_seconds: u64, shutdown: CancellationToken) {
        let metrics = get_metrics().await;
        let mut backoff = Backoff::new(self.settings.initial_backoff, self.settings.max_backoff);
        let mut last = LastAttempt::Succeeded { expiration_seconds };

        loop {
            let delay = next_delay(last, self.settings.safety_margin, &backoff);
            metrics
                .token_refresh_backoff_seconds
                .set(backoff.current().as_secs() as i64);
            debug!("next token refresh in {:?}", delay);

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            self.transition(LifecycleState::Refreshing);
            let result = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                result = self.fetch_once(PHASE_REFRESH) => result,
            };

            last = match result {
                Ok(payload) => {
                    let state = self.store_payload(payload).await;
                    backoff.reset();
                    self.transition(LifecycleState::Ready);
                    info!("refreshed token, expires in {} seconds", state.expiration_seconds);
                    LastAttempt::Succeeded {
                        expiration_seconds: state.expiration_seconds,
                    }
                }
                Err(e) => {
                    let retry_in = backoff.on_failure();
                    self.transition(LifecycleState::FailedTransient);
                    warn!(
                        "error while refreshing token, keeping cached token, retry in {:?}: {}",
                        retry_in, e
                    );
                    LastAttempt::Failed
                }
            };
        }

        self.transition(LifecycleState::Stopped);
        info!("token refresh loop stopped");
    }
}
