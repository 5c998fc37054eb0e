// src/almanac.rs
//! Almanac collector: sunrise/sunset data from sunrisesunset.io, fetched at
//! most once per UTC day.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::cache::{PollingCache, RefreshOutcome, Source};
use crate::config::AlmanacConfig;
use crate::error::FetchError;
use crate::shutdown::ShutdownSignal;
use crate::transport::{HttpRequest, Transport};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// `results` object as returned by the API. Times are `HH:MM:SS` in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlmanacResults {
    pub date: String,
    pub sunrise: String,
    pub sunset: String,
    #[serde(default)]
    pub first_light: String,
    #[serde(default)]
    pub last_light: String,
    #[serde(default)]
    pub dawn: String,
    #[serde(default)]
    pub dusk: String,
    #[serde(default)]
    pub solar_noon: String,
    #[serde(default)]
    pub golden_hour: String,
    #[serde(default)]
    pub day_length: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub utc_offset: i32,
}

#[derive(Debug, Deserialize)]
struct AlmanacResponse {
    results: AlmanacResults,
    #[serde(default)]
    status: String,
}

pub struct AlmanacSource {
    transport: Arc<dyn Transport>,
    url: String,
    timeout: std::time::Duration,
}

impl AlmanacSource {
    pub fn new(transport: Arc<dyn Transport>, cfg: &AlmanacConfig) -> Self {
        let url = format!(
            "{}?lat={:.6}&lng={:.6}&timezone=UTC&time_format=24",
            cfg.base_url, cfg.latitude, cfg.longitude
        );
        Self {
            transport,
            url,
            timeout: cfg.timeout(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT).ok()
}

/// Reject payloads whose date or sunrise/sunset can't be read back later.
fn validate(results: &AlmanacResults) -> Result<(), FetchError> {
    if parse_date(&results.date).is_none() {
        return Err(FetchError::Field {
            field: "date",
            value: results.date.clone(),
        });
    }
    for (field, value) in [("sunrise", &results.sunrise), ("sunset", &results.sunset)] {
        if parse_time(value).is_none() {
            return Err(FetchError::Field {
                field,
                value: value.clone(),
            });
        }
    }
    Ok(())
}

#[async_trait]
impl Source for AlmanacSource {
    type Reading = AlmanacResults;

    fn name(&self) -> &'static str {
        "almanac"
    }

    /// Fresh while the cached date is today's UTC date.
    fn is_fresh(&self, cached: &AlmanacResults, now: DateTime<Utc>) -> bool {
        match parse_date(&cached.date) {
            Some(d) => d == now.date_naive(),
            None => false,
        }
    }

    async fn fetch(&self) -> Result<AlmanacResults, FetchError> {
        let req = HttpRequest::get(&self.url, self.timeout);
        let resp = self.transport.get(&req).await?;
        if resp.status != 200 {
            return Err(FetchError::Status(resp.status));
        }

        let data: AlmanacResponse = serde_json::from_str(&resp.body)?;
        if !data.status.is_empty() && !data.status.eq_ignore_ascii_case("OK") {
            return Err(FetchError::Upstream {
                code: -1,
                message: data.status,
            });
        }

        validate(&data.results)?;
        Ok(data.results)
    }
}

/// Cached almanac with typed accessors.
pub struct Almanac {
    cache: PollingCache<AlmanacSource>,
}

impl Almanac {
    pub fn new(transport: Arc<dyn Transport>, cfg: &AlmanacConfig) -> Self {
        Self {
            cache: PollingCache::new(AlmanacSource::new(transport, cfg), cfg.refresh_interval()),
        }
    }

    pub async fn fetch(&self) -> RefreshOutcome {
        self.cache.refresh().await
    }

    pub async fn fetch_at(&self, now: DateTime<Utc>) -> RefreshOutcome {
        self.cache.refresh_at(now).await
    }

    pub async fn run(&self, shutdown: ShutdownSignal) {
        self.cache.run(shutdown).await
    }

    pub fn results(&self) -> Option<Arc<AlmanacResults>> {
        self.cache.latest()
    }

    pub fn sunrise(&self) -> Option<DateTime<Utc>> {
        self.timestamp_of("sunrise", |r| &r.sunrise)
    }

    pub fn sunset(&self) -> Option<DateTime<Utc>> {
        self.timestamp_of("sunset", |r| &r.sunset)
    }

    // Each call reads the store on its own; sunrise and sunset may come from
    // different readings if a refresh lands in between.
    fn timestamp_of(
        &self,
        field: &'static str,
        pick: impl Fn(&AlmanacResults) -> &String,
    ) -> Option<DateTime<Utc>> {
        let results = self.cache.latest()?;
        let raw = format!("{} {}", results.date, pick(&results));
        match NaiveDateTime::parse_from_str(&raw, &format!("{DATE_FORMAT} {TIME_FORMAT}")) {
            Ok(dt) => Some(dt.and_utc()),
            Err(e) => {
                error!(collector = "almanac", field, value = %raw, error = %e, "parsing cached time");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn results(date: &str) -> AlmanacResults {
        AlmanacResults {
            date: date.into(),
            sunrise: "06:00:00".into(),
            sunset: "21:45:00".into(),
            ..Default::default()
        }
    }

    fn source() -> AlmanacSource {
        let transport: Arc<dyn Transport> = Arc::new(crate::transport::MockTransport::status(500));
        AlmanacSource::new(transport, &AlmanacConfig::default())
    }

    #[test]
    fn url_bakes_in_coordinates() {
        assert_eq!(
            source().url(),
            "https://api.sunrisesunset.io/json?lat=48.744760&lng=-0.962368&timezone=UTC&time_format=24"
        );
    }

    #[test]
    fn fresh_only_on_same_utc_day() {
        let s = source();
        let cached = results("2024-06-01");
        let morning = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 1).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 6, 1, 23, 59, 59).unwrap();
        let next = Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap();
        assert!(s.is_fresh(&cached, morning));
        assert!(s.is_fresh(&cached, late));
        assert!(!s.is_fresh(&cached, next));
    }

    #[test]
    fn unparseable_cached_date_is_stale() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert!(!source().is_fresh(&results("June 1st"), now));
    }

    #[test]
    fn validate_rejects_bad_times() {
        assert!(validate(&results("2024-06-01")).is_ok());

        let mut bad = results("2024-06-01");
        bad.sunset = "9:45 PM".into();
        assert!(matches!(
            validate(&bad),
            Err(FetchError::Field { field: "sunset", .. })
        ));

        assert!(matches!(
            validate(&results("01/06/2024")),
            Err(FetchError::Field { field: "date", .. })
        ));
    }
}
