use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::SecondsFormat;
use serde_json::json;
use tracing::debug;

use crate::server::server::AppState;
use crate::token::TokenHandle;

pub const TOKEN_PATH: &str = "/token";

#[derive(Clone)]
pub struct TokenRouteState {
    handle: Arc<TokenHandle>,
}

impl TokenRouteState {
    pub fn new(handle: Arc<TokenHandle>) -> Self {
        Self { handle }
    }

    pub fn router(&self) -> Router<AppState> {
        Router::new().route(TOKEN_PATH, get(get_token))
    }
}

async fn get_token(State(state): State<AppState>) -> Response {
    match state.token_state.handle.snapshot() {
        Some(token) => {
            debug!("serving token, lifecycle state {}", state.token_state.handle.state());
            Json(json!({
                "access_token": token.value,
                "expires_in": token.expiration_seconds,
                "last_updated": token.last_updated.to_rfc3339_opts(SecondsFormat::Secs, true),
                "expires_at": token
                    .expires_at()
                    .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true)),
            }))
            .into_response()
        }
        None => (StatusCode::SERVICE_UNAVAILABLE, "token not initialized").into_response(),
    }
}
