use std::time::Duration;

use http::StatusCode;

/// Failure of a single token fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("error while building connection string: {0}")]
    Endpoint(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP request failed with status: {0}")]
    Status(StatusCode),

    #[error("error while parsing token response: {0}")]
    Parse(String),

    /// Free-form failure reported by a custom token source.
    #[error("{0}")]
    Source(String),
}

impl FetchError {
    /// Short label used for the failure metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            FetchError::Endpoint(_) => "endpoint",
            FetchError::Transport(_) => "transport",
            FetchError::Status(_) => "status",
            FetchError::Parse(_) => "parse",
            FetchError::Source(_) => "source",
        }
    }
}

/// Errors surfaced to whoever builds or reads a [`crate::token::TokenHandle`].
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Every required field that was absent, in declaration order.
    #[error("missing required configuration: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// Lifecycle timings that would break the refresh schedule.
    #[error("invalid lifecycle settings: {}", .0.join(", "))]
    InvalidSettings(Vec<&'static str>),

    #[error("error while receiving the first token: {0}")]
    InitialFetch(#[source] FetchError),

    #[error("timeout while receiving the first token after {0:?}")]
    DeadlineExceeded(Duration),

    #[error("token not initialized")]
    NotInitialized,
}
