use prometheus::{
    Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
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

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Issuer metrics
    pub grants_issued: IntCounterVec,
    pub grant_issue_failures: IntCounterVec,
    pub grant_issue_duration: Histogram,
    pub grant_verifications: IntCounterVec,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,

    // === Service resource metrics ===
    pub process_cpu_usage: Gauge,
    pub process_memory_usage: IntGauge,
    pub process_open_fds: IntGauge,
    pub process_start_time: IntGauge,
    pub process_uptime: IntGauge,
}

const DEFINITION: &str = "metric definition";

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("docgrant".into()), None).expect(DEFINITION);

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Issuer
            grants_issued: IntCounterVec::new(Opts::new("grants_issued_total", "Grants issued by access level"), &["access_level"]).expect(DEFINITION),
            grant_issue_failures: IntCounterVec::new(Opts::new("grant_issue_failures_total", "Grant issue failures by reason"), &["reason"]).expect(DEFINITION),
            grant_issue_duration: Histogram::with_opts(HistogramOpts::new("grant_issue_duration_seconds", "Grant issue duration seconds").buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1])).expect(DEFINITION),
            grant_verifications: IntCounterVec::new(Opts::new("grant_verifications_total", "Grant verifications by result"), &["result"]).expect(DEFINITION),

            // Config/runtime
            config_validation_errors: IntCounter::new("config_validation_errors_total", "Validation errors during startup").expect(DEFINITION),
            up: IntGauge::new("up", "1 if service is healthy").expect(DEFINITION),
            process_cpu_usage: Gauge::new("process_cpu_usage_percent", "CPU usage % of this process").expect(DEFINITION),
            process_memory_usage: IntGauge::new("process_memory_usage_bytes", "Resident memory used by this process").expect(DEFINITION),
            process_open_fds: IntGauge::new("process_open_fds", "Number of open file descriptors").expect(DEFINITION),
            process_start_time: IntGauge::new("process_start_time_seconds", "Process start time (UNIX seconds)").expect(DEFINITION),
            process_uptime: IntGauge::new("process_uptime_seconds", "Process uptime seconds").expect(DEFINITION),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.grants_issued.clone())).expect(DEFINITION);
        reg.register(Box::new(metrics.grant_issue_failures.clone())).expect(DEFINITION);
        reg.register(Box::new(metrics.grant_issue_duration.clone())).expect(DEFINITION);
        reg.register(Box::new(metrics.grant_verifications.clone())).expect(DEFINITION);
        reg.register(Box::new(metrics.config_validation_errors.clone())).expect(DEFINITION);
        reg.register(Box::new(metrics.up.clone())).expect(DEFINITION);

        reg.register(Box::new(metrics.process_cpu_usage.clone())).expect(DEFINITION);
        reg.register(Box::new(metrics.process_memory_usage.clone())).expect(DEFINITION);
        reg.register(Box::new(metrics.process_open_fds.clone())).expect(DEFINITION);
        reg.register(Box::new(metrics.process_start_time.clone())).expect(DEFINITION);
        reg.register(Box::new(metrics.process_uptime.clone())).expect(DEFINITION);

        metrics
    }
}
