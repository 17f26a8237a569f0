// Construction path and refresh scheduling of a token handle.
// Timing tests run on a paused clock, so the asserted delays are exact up to
// timer-wheel rounding.

#[cfg(test)]
mod test {

    use std::sync::Arc;
    use std::time::Duration;

    use httpmock::prelude::*;
    use tokio::time::{sleep, Instant};

    use crate::config::connection::ConnectionConfig;
    use crate::config::settings::LifecycleSettings;
    use crate::error::{FetchError, TokenError};
    use crate::manager::LifecycleState;
    use crate::sources::KeycloakSource;
    use crate::tests::common::{assert_close, test_connection, ScriptedSource, Step};
    use crate::token::{TokenBuilder, TokenHandle};

    fn scripted(steps: impl IntoIterator<Item = Step>) -> Arc<ScriptedSource> {
        Arc::new(ScriptedSource::new(steps))
    }

    async fn construct(source: &Arc<ScriptedSource>) -> Result<TokenHandle, TokenError> {
        TokenHandle::construct(test_connection(), LifecycleSettings::default(), source.clone()).await
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_fires_safety_margin_before_expiry() {
        let source = scripted([Step::Token("abc123", 23), Step::Token("def456", 23)]);

        let handle = construct(&source).await.expect("construct");
        assert_eq!(handle.get().unwrap(), "abc123");
        assert_eq!(handle.state(), LifecycleState::Ready);
        assert_eq!(source.call_count(), 1);

        sleep(Duration::from_secs(17)).await;
        assert_eq!(source.call_count(), 1, "refreshed too early");

        sleep(Duration::from_secs(2)).await;
        assert_eq!(source.call_count(), 2);
        assert_close(source.intervals()[0], Duration::from_secs(18));
        assert_eq!(handle.get().unwrap(), "def456");
    }

    #[tokio::test(start_paused = true)]
    async fn short_lived_token_refreshes_after_initial_backoff() {
        let source = scripted([
            Step::Token("short-1", 2),
            Step::Token("short-2", 2),
            Step::Token("long", 3600),
        ]);

        let handle = construct(&source).await.expect("construct");
        sleep(Duration::from_millis(2500)).await;

        assert_eq!(source.call_count(), 3);
        for interval in source.intervals() {
            assert_close(interval, Duration::from_secs(1));
        }
        assert_eq!(handle.get().unwrap(), "long");
    }

    #[tokio::test(start_paused = true)]
    async fn custom_safety_margin_is_honoured() {
        let source = scripted([Step::Token("a", 60), Step::Token("b", 60)]);

        let _handle = TokenBuilder::new()
            .server("localhost")
            .port(8080)
            .realm("test-realm")
            .client_id("test-client")
            .client_secret("test-client999")
            .safety_margin(Duration::from_secs(20))
            .shared_token_source(source.clone())
            .build()
            .await
            .expect("build");

        sleep(Duration::from_secs(41)).await;
        assert_eq!(source.call_count(), 2);
        assert_close(source.intervals()[0], Duration::from_secs(40));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_fields_are_all_reported_without_fetching() {
        let source = scripted([Step::Token("never", 60)]);

        let err = TokenBuilder::new()
            .server("localhost")
            .client_secret("")
            .shared_token_source(source.clone())
            .build()
            .await
            .unwrap_err();

        match err {
            TokenError::MissingFields(fields) => {
                assert_eq!(fields, vec!["port", "realm", "client_id", "client_secret"])
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(source.call_count(), 0);
    }

    fn complete_builder(source: &Arc<ScriptedSource>) -> TokenBuilder<ScriptedSource> {
        TokenBuilder::new()
            .server("localhost")
            .port(8080)
            .realm("test-realm")
            .client_id("test-client")
            .client_secret("test-client999")
            .shared_token_source(source.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn zero_backoff_is_rejected_without_fetching() {
        let source = scripted([Step::Token("a", 2), Step::Fail("down")]);

        let err = complete_builder(&source)
            .backoff(Duration::ZERO, Duration::ZERO)
            .build()
            .await
            .unwrap_err();

        assert!(matches!(err, TokenError::InvalidSettings(ref f) if f == &vec!["initial_backoff"]));
        assert_eq!(err.to_string(), "invalid lifecycle settings: initial_backoff");
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_fetch_timeout_is_a_configuration_error() {
        let source = scripted([Step::Token("a", 60)]);

        let err = complete_builder(&source)
            .fetch_timeout(Duration::ZERO)
            .build()
            .await
            .unwrap_err();

        assert!(matches!(err, TokenError::InvalidSettings(ref f) if f == &vec!["fetch_timeout"]));
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn construct_rejects_backoff_cap_below_initial() {
        let source = scripted([Step::Token("a", 60)]);
        let settings = LifecycleSettings {
            initial_backoff: Duration::from_secs(30),
            max_backoff: Duration::from_secs(10),
            ..LifecycleSettings::default()
        };

        let err = TokenHandle::construct(test_connection(), settings, source.clone())
            .await
            .unwrap_err();

        assert!(matches!(err, TokenError::InvalidSettings(ref f) if f == &vec!["max_backoff"]));
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_token_source_is_reported_with_other_fields() {
        let err = TokenBuilder::<ScriptedSource>::new()
            .server("localhost")
            .port(8080)
            .build()
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "missing required configuration: realm, client_id, client_secret, token_source"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn construct_rejects_incomplete_connection() {
        let source = scripted([Step::Token("never", 60)]);
        let connection = ConnectionConfig {
            realm: None,
            ..test_connection()
        };

        let err = TokenHandle::construct(connection, LifecycleSettings::default(), source.clone())
            .await
            .unwrap_err();

        assert!(matches!(err, TokenError::MissingFields(ref f) if f == &vec!["realm"]));
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn initial_source_error_is_fatal() {
        let source = scripted([Step::Fail("invalid_client")]);

        let err = construct(&source).await.unwrap_err();

        assert!(matches!(err, TokenError::InitialFetch(FetchError::Source(ref m)) if m == "invalid_client"));
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn initial_deadline_is_fatal() {
        let source = scripted([Step::Hang]);
        let start = Instant::now();

        let err = construct(&source).await.unwrap_err();

        assert!(matches!(err, TokenError::DeadlineExceeded(d) if d == Duration::from_secs(10)));
        assert_close(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn unauthorized_response_fails_construction() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/realms/test-realm/protocol/openid-connect/token");
                then.status(401).body(r#"{"error":"unauthorized_client"}"#);
            })
            .await;

        let result = TokenBuilder::new()
            .server(server.host())
            .port(server.port())
            .realm("test-realm")
            .client_id("test-client")
            .client_secret("wrong")
            .token_source(KeycloakSource::default())
            .build()
            .await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert!(matches!(err, TokenError::InitialFetch(FetchError::Status(_))));
        assert!(err.to_string().contains("401"), "{}", err);
    }

    #[tokio::test]
    async fn keycloak_source_end_to_end() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/realms/test-realm/protocol/openid-connect/token")
                    .form_urlencoded_tuple("client_id", "test-client");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"{"access_token":"abc123","expires_in":23}"#);
            })
            .await;

        let handle = TokenHandle::builder()
            .server(server.host())
            .port(server.port())
            .realm("test-realm")
            .client_id("test-client")
            .client_secret("test-client999")
            .token_source(KeycloakSource::default())
            .build()
            .await
            .expect("build");

        assert_eq!(handle.get().unwrap(), "abc123");
        let snapshot = handle.snapshot().unwrap();
        assert_eq!(snapshot.expiration_seconds, 23);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_the_refresh_loop_while_sleeping() {
        let source = scripted([Step::Token("a", 23), Step::Token("b", 23)]);
        let handle = construct(&source).await.expect("construct");

        sleep(Duration::from_secs(5)).await;
        handle.stop();
        sleep(Duration::from_secs(60)).await;

        assert_eq!(handle.state(), LifecycleState::Stopped);
        assert_eq!(source.call_count(), 1);
        assert_eq!(handle.get().unwrap(), "a", "stopping keeps the last token readable");
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_an_in_flight_fetch() {
        let source = scripted([Step::Token("a", 6), Step::Hang]);
        let handle = construct(&source).await.expect("construct");

        sleep(Duration::from_secs(2)).await;
        assert_eq!(source.call_count(), 2, "second fetch should be in flight");

        let start = Instant::now();
        handle.shutdown().await;
        assert!(start.elapsed() < Duration::from_secs(1), "shutdown waited for the fetch deadline");
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_refreshing() {
        let source = scripted([Step::Token("a", 6), Step::Token("b", 6)]);
        let handle = construct(&source).await.expect("construct");
        drop(handle);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(source.call_count(), 1);
    }
}
