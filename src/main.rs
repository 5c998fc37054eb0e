//! Clock dashboard — binary entrypoint.
//! Starts both collectors, serves the HTML fragments, and shuts everything
//! down on SIGINT/SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clock_dashboard::{
    api::{self, AppState},
    config::{DashboardConfig, SensorCredentials},
    metrics::Metrics,
    shutdown::{self, ShutdownTrigger},
    snippets::DisplaySettings,
    transport::{ReqwestTransport, Transport},
    Almanac, Sensor,
};

/// RUST_LOG controls the filter (default `info`); LOG_FORMAT=json switches
/// to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

async fn shutdown_on_signal(trigger: ShutdownTrigger) {
    wait_for_signal().await;
    info!("shutdown signal received");
    trigger.trigger();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = DashboardConfig::load_default()?;
    let credentials = SensorCredentials::from_env()
        .context("failed to process ewelink environment variables")?;
    let metrics = Metrics::init()?;

    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new());
    let sensor = Arc::new(Sensor::new(transport.clone(), &cfg.sensor, credentials));
    let almanac = Arc::new(Almanac::new(transport, &cfg.almanac));

    let (trigger, signal) = shutdown::channel();

    let sensor_task = tokio::spawn({
        let sensor = sensor.clone();
        let signal = signal.clone();
        async move { sensor.run(signal).await }
    });
    let almanac_task = tokio::spawn({
        let almanac = almanac.clone();
        let signal = signal.clone();
        async move { almanac.run(signal).await }
    });

    let display = DisplaySettings::new(
        &cfg.display_timezone,
        cfg.sensor.stale_after_secs,
        cfg.sensor.low_battery_percent,
    );
    let state = AppState {
        almanac,
        sensor,
        display: Arc::new(display),
    };
    let app = api::create_router(state, &cfg.static_dir).merge(metrics.router());

    let listener = TcpListener::bind(&cfg.listen_addr)
        .await
        .with_context(|| format!("binding {}", cfg.listen_addr))?;
    info!(addr = %cfg.listen_addr, "starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_on_signal(trigger))
        .await
        .context("server error")?;
    info!("server stopped");

    for (name, task) in [("sensor", sensor_task), ("almanac", almanac_task)] {
        if let Err(e) = task.await {
            error!(collector = name, error = %e, "collector task failed");
        }
    }

    Ok(())
}
