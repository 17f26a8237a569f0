use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

pub const PHASE_INITIAL: &str = "initial";
pub const PHASE_REFRESH: &str = "refresh";

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Fetch metrics
    pub token_fetch_requests: IntCounterVec,
    pub token_fetch_failures: IntCounterVec,
    pub token_fetch_duration: HistogramVec,

    // Lifecycle metrics
    pub token_refresh_backoff_seconds: IntGauge,
    pub token_expiration_seconds: IntGauge,
    pub token_last_updated_unix: IntGauge,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("tokenkeeper".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Fetch
            token_fetch_requests: IntCounterVec::new(Opts::new("token_fetch_requests_total", "Total token fetch attempts by phase"), &["phase"]).unwrap(),
            token_fetch_failures: IntCounterVec::new(Opts::new("token_fetch_failures_total", "Token fetch failures by phase and reason"), &["phase", "reason"]).unwrap(),
            token_fetch_duration: HistogramVec::new(HistogramOpts::new("token_fetch_duration_seconds", "Token fetch duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]), &["phase"]).unwrap(),

            // Lifecycle
            token_refresh_backoff_seconds: IntGauge::new("token_refresh_backoff_seconds", "Current retry backoff of the refresh loop").unwrap(),
            token_expiration_seconds: IntGauge::new("token_expiration_seconds", "Lifetime of the cached token as reported by the provider").unwrap(),
            token_last_updated_unix: IntGauge::new("token_last_updated_unix_seconds", "Time the cached token was last replaced").unwrap(),

            // Config/runtime
            config_validation_errors: IntCounter::new("config_validation_errors_total", "Validation errors during startup").unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_fetch_requests.clone())).unwrap();
        reg.register(Box::new(metrics.token_fetch_failures.clone())).unwrap();
        reg.register(Box::new(metrics.token_fetch_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_refresh_backoff_seconds.clone())).unwrap();
        reg.register(Box::new(metrics.token_expiration_seconds.clone())).unwrap();
        reg.register(Box::new(metrics.token_last_updated_unix.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
