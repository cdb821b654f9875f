use anyhow::Result;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;


// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Token cache metrics
    pub token_refreshes: IntCounterVec,
    pub token_refresh_failures: IntCounterVec,

    // Downstream API metrics
    pub api_requests: IntCounterVec,
    pub api_request_duration: HistogramVec,

    // Workflow metrics
    pub workflow_items: IntCounterVec,
    pub workflow_runs: IntCounterVec,

    // Config/runtime
    pub config_validation_errors: IntCounter,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("avatarsync".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Token cache
            token_refreshes: IntCounterVec::new(Opts::new("token_refreshes_total", "Successful token refreshes by provider"),&["provider"],).unwrap(),
            token_refresh_failures: IntCounterVec::new(Opts::new("token_refresh_failures_total", "Token refresh failures by provider and kind"),&["provider", "kind"],).unwrap(),

            // Downstream APIs
            api_requests: IntCounterVec::new(Opts::new("api_requests_total", "Requests by api, operation and outcome"),&["api", "operation", "outcome"],).unwrap(),
            api_request_duration: HistogramVec::new(HistogramOpts::new("api_request_duration_seconds", "Request duration seconds").buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),&["api", "operation"],).unwrap(),

            // Workflows
            workflow_items: IntCounterVec::new(Opts::new("workflow_items_total", "Per-user workflow outcomes"),&["workflow", "outcome"],).unwrap(),
            workflow_runs: IntCounterVec::new(Opts::new("workflow_runs_total", "Workflow runs by result"),&["workflow", "result"],).unwrap(),

            config_validation_errors: IntCounter::new("config_validation_errors_total","Validation errors during startup",).unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_refreshes.clone())).unwrap();
        reg.register(Box::new(metrics.token_refresh_failures.clone())).unwrap();
        reg.register(Box::new(metrics.api_requests.clone())).unwrap();
        reg.register(Box::new(metrics.api_request_duration.clone())).unwrap();
        reg.register(Box::new(metrics.workflow_items.clone())).unwrap();
        reg.register(Box::new(metrics.workflow_runs.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();

        metrics
    }

    /// Prometheus text exposition of everything registered.
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn observe_api(&self, api: &str, operation: &str, ok: bool, elapsed: std::time::Duration) {
        let outcome = if ok { "ok" } else { "error" };
        self.api_requests.with_label_values(&[api, operation, outcome]).inc();
        self.api_request_duration
            .with_label_values(&[api, operation])
            .observe(elapsed.as_secs_f64());
    }
}
