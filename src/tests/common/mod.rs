// tests/common/mod.rs
pub use axum::Router;
pub use tokio::task::JoinHandle;

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::Client;
use tokio::time::Instant;

use crate::config::connection::{ConnectionConfig, ConnectionParams};
use crate::error::FetchError;
use crate::sources::{TokenPayload, TokenSource};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

/// `{server=localhost, port=8080, realm=test-realm, client=test-client, secret=test-client999}`
pub fn test_connection() -> ConnectionConfig {
    ConnectionConfig {
        scheme: None,
        server: Some("localhost".into()),
        port: Some(8080),
        realm: Some("test-realm".into()),
        client_id: Some("test-client".into()),
        client_secret: Some("test-client999".into()),
    }
}

/// One scripted answer of [`ScriptedSource`].
#[derive(Debug, Clone)]
pub enum Step {
    Token(&'static str, u64),
    Fail(&'static str),
    /// never resolves
    Hang,
    /// resolves with a token after the given delay
    Delayed(Duration, &'static str, u64),
}

/// Token source replaying a fixed script and recording when it was called.
/// Once the script is exhausted every call fails.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<Instant>>,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Gaps between consecutive calls.
    pub fn intervals(&self) -> Vec<Duration> {
        self.calls().windows(2).map(|w| w[1] - w[0]).collect()
    }
}

impl TokenSource for ScriptedSource {
    async fn fetch_token(&self, _params: &ConnectionParams) -> Result<TokenPayload, FetchError> {
        let step = {
            self.calls.lock().unwrap().push(Instant::now());
            self.steps.lock().unwrap().pop_front()
        };
        match step {
            Some(Step::Token(token, expires_in)) => Ok(TokenPayload::new(token, expires_in)),
            Some(Step::Fail(msg)) => Err(FetchError::Source(msg.to_owned())),
            Some(Step::Hang) => std::future::pending().await,
            Some(Step::Delayed(delay, token, expires_in)) => {
                tokio::time::sleep(delay).await;
                Ok(TokenPayload::new(token, expires_in))
            }
            None => Err(FetchError::Source("script exhausted".to_owned())),
        }
    }
}

/// Assert `actual` is `expected` give or take scheduler rounding.
pub fn assert_close(actual: Duration, expected: Duration) {
    let tolerance = Duration::from_millis(50);
    assert!(
        actual >= expected && actual <= expected + tolerance,
        "expected ~{:?}, got {:?}",
        expected,
        actual
    );
}
