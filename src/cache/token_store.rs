use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::cache::token::TokenState;

/// Holds the current token as an immutable snapshot.
///
/// Writes swap in a whole new [`TokenState`], so a reader sees either the
/// previous record or the next one and never a mix of both.
#[derive(Debug, Default)]
pub struct TokenStore {
    inner: ArcSwapOption<TokenState>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self {
            inner: ArcSwapOption::const_empty(),
        }
    }

    /// Current token string, `None` until the first write.
    pub fn read(&self) -> Option<String> {
        self.inner.load().as_ref().map(|state| state.value.clone())
    }

    /// Full snapshot including metadata.
    pub fn snapshot(&self) -> Option<Arc<TokenState>> {
        self.inner.load_full()
    }

    /// Replace the stored token and stamp the update time.
    pub fn write(&self, value: String, expiration_seconds: u64) -> Arc<TokenState> {
        let state = Arc::new(TokenState::new(value, expiration_seconds));
        self.inner.store(Some(state.clone()));
        state
    }
}
