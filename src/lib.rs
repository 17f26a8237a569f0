//! # Token Keeper Library
//!
//! Fetches an OAuth2 client-credentials access token, caches it, and keeps
//! it fresh in the background so readers always get a token without
//! waiting on the network.
//!
//! Modules:
//! - `token` - public handle and fluent builder
//! - `manager` - acquisition, refresh scheduling and backoff
//! - `cache` - lock-free token snapshot store
//! - `sources` - token source contract and the Keycloak HTTP source
//! - `config` - YAML service configuration and validation

pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod observability;
pub mod resilience;
pub mod server;
pub mod sources;
pub mod tests;
pub mod token;
pub mod utils;

pub use crate::error::{FetchError, TokenError};
pub use crate::sources::{TokenPayload, TokenSource};
pub use crate::token::{TokenBuilder, TokenHandle};
