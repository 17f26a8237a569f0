use std::fmt;
use std::time::Duration;

use crate::resilience::retry::Backoff;

/// Where a token handle is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Acquiring,
    Ready,
    Refreshing,
    FailedTransient,
    FailedFatal,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Acquiring => "acquiring",
            LifecycleState::Ready => "ready",
            LifecycleState::Refreshing => "refreshing",
            LifecycleState::FailedTransient => "failed_transient",
            LifecycleState::FailedFatal => "failed_fatal",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Outcome of the most recent fetch, as seen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastAttempt {
    Succeeded { expiration_seconds: u64 },
    Failed,
}

/// How long the refresh loop sleeps before its next fetch.
///
/// After a failure the current backoff is used. After a success the loop wakes
/// `safety_margin` before expiry, or after the backoff when the token lives no
/// longer than the margin.
pub fn next_delay(last: LastAttempt, safety_margin: Duration, backoff: &Backoff) -> Duration {
    match last {
        LastAttempt::Failed => backoff.current(),
        LastAttempt::Succeeded { expiration_seconds } => Duration::from_secs(expiration_seconds)
            .checked_sub(safety_margin)
            .filter(|delay| !delay.is_zero())
            .unwrap_or_else(|| backoff.current()),
    }
}
