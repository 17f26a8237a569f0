use chrono::{DateTime, TimeDelta, Utc};

/// Snapshot of the cached token. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenState {
    pub value: String,
    pub expiration_seconds: u64, // lifetime reported by the provider
    pub last_updated: DateTime<Utc>,
}

impl TokenState {
    pub fn new(value: String, expiration_seconds: u64) -> Self {
        Self {
            value,
            expiration_seconds,
            last_updated: Utc::now(),
        }
    }

    /// Absolute expiry derived from the update stamp, `None` when the reported
    /// lifetime does not fit the calendar.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.expiration_seconds).ok()?;
        self.last_updated.checked_add_signed(TimeDelta::try_seconds(secs)?)
    }
}
