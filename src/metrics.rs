use axum::{routing::get, Router};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once, from `main`.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;
        ensure_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One-time metrics registration (so series show up on /metrics).
fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "collector_refresh_total",
            "Refresh attempts per collector, by outcome (updated/skipped/failed)."
        );
        describe_counter!(
            "collector_fetch_errors_total",
            "Transient fetch errors per collector, by reason."
        );
        describe_gauge!(
            "collector_last_success_timestamp_seconds",
            "Unix ts of the last successful fetch per collector."
        );
    });
}

pub(crate) fn record_refresh(collector: &'static str, outcome: &'static str) {
    counter!("collector_refresh_total", "collector" => collector, "outcome" => outcome)
        .increment(1);
}

pub(crate) fn record_fetch_error(collector: &'static str, reason: &'static str) {
    counter!("collector_fetch_errors_total", "collector" => collector, "reason" => reason)
        .increment(1);
}

pub(crate) fn record_success(collector: &'static str, unix_ts: i64) {
    gauge!("collector_last_success_timestamp_seconds", "collector" => collector)
        .set(unix_ts as f64);
}
