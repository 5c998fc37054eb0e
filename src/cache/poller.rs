// src/cache/poller.rs
//! Generic polling cache: staleness check, fetch, write-on-success, and the
//! background loop that drives it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::store::CachedValue;
use crate::error::FetchError;
use crate::metrics;
use crate::shutdown::ShutdownSignal;

/// One upstream data source feeding a `PollingCache`.
#[async_trait]
pub trait Source: Send + Sync + 'static {
    type Reading: Send + Sync + 'static;

    /// Collector label for logs and metrics.
    fn name(&self) -> &'static str;

    /// Staleness predicate. `true` means the cached reading is still good
    /// and the fetch is skipped. Sources without one always refetch.
    fn is_fresh(&self, _cached: &Self::Reading, _now: DateTime<Utc>) -> bool {
        false
    }

    async fn fetch(&self) -> Result<Self::Reading, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Skipped,
    Updated,
    Failed,
}

impl RefreshOutcome {
    fn as_str(self) -> &'static str {
        match self {
            RefreshOutcome::Skipped => "skipped",
            RefreshOutcome::Updated => "updated",
            RefreshOutcome::Failed => "failed",
        }
    }
}

pub struct PollingCache<S: Source> {
    source: S,
    store: CachedValue<S::Reading>,
    interval: Duration,
}

impl<S: Source> PollingCache<S> {
    pub fn new(source: S, interval: Duration) -> Self {
        Self {
            source,
            store: CachedValue::empty(),
            interval,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn latest(&self) -> Option<Arc<S::Reading>> {
        self.store.read()
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        self.refresh_at(Utc::now()).await
    }

    /// Refresh as if the current time were `now`. Overlapping calls are not
    /// serialized: both may fetch and the last write wins.
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> RefreshOutcome {
        let name = self.source.name();

        let outcome = match self.store.read() {
            Some(cached) if self.source.is_fresh(&cached, now) => {
                debug!(collector = name, "cached reading still fresh; skipping fetch");
                RefreshOutcome::Skipped
            }
            _ => match self.source.fetch().await {
                Ok(reading) => {
                    self.store.write(reading);
                    metrics::record_success(name, Utc::now().timestamp());
                    debug!(collector = name, "cached reading updated");
                    RefreshOutcome::Updated
                }
                Err(e) => {
                    warn!(collector = name, error = %e, "fetch failed; keeping cached reading");
                    metrics::record_fetch_error(name, e.kind());
                    RefreshOutcome::Failed
                }
            },
        };

        metrics::record_refresh(name, outcome.as_str());
        outcome
    }

    /// Fetch once right away, then once per interval until `shutdown` fires.
    /// Shutdown is only observed between refreshes; an in-flight fetch runs
    /// to completion (bounded by its own timeout).
    pub async fn run(&self, mut shutdown: ShutdownSignal) {
        let name = self.source.name();
        let period = self.interval();
        info!(
            collector = name,
            interval_secs = period.as_secs(),
            "collector started"
        );

        self.refresh().await;

        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {
                    self.refresh().await;
                }
            }
        }

        info!(collector = name, "collector stopped");
    }
}
