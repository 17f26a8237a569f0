//! Token sources.
//!
//! A [`TokenSource`] performs one network exchange per call and yields a
//! single [`TokenPayload`] or a [`FetchError`]. It does not enforce deadlines;
//! the lifecycle manager races every call against its own timer.

use std::future::Future;

use serde::Deserialize;

use crate::config::connection::ConnectionParams;
use crate::error::FetchError;

pub mod keycloak;

pub use keycloak::KeycloakSource;

/// Token issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPayload {
    pub token: String,
    pub expiration_seconds: u64,
}

impl TokenPayload {
    pub fn new(token: impl Into<String>, expiration_seconds: u64) -> Self {
        Self {
            token: token.into(),
            expiration_seconds,
        }
    }
}

pub trait TokenSource: Send + Sync + 'static {
    /// Request one token. The returned future resolves at most once.
    fn fetch_token(
        &self,
        params: &ConnectionParams,
    ) -> impl Future<Output = Result<TokenPayload, FetchError>> + Send;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Parse an OAuth2 token endpoint response body.
pub fn parse_token_response(body: &str) -> Result<TokenPayload, FetchError> {
    let response: TokenResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::Parse(format!("{}, body: {}", e, body)))?;
    Ok(TokenPayload::new(response.access_token, response.expires_in))
}
