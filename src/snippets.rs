// src/snippets.rs
//! HTML fragments polled by the clock page.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::error;

use crate::sensor::SensorReading;

// Keeps `Duration::seconds` in range.
const MAX_STALE_SECS: u64 = 100 * 365 * 24 * 3600;

/// How times are shown: zone plus the sensor warning thresholds.
#[derive(Debug, Clone)]
pub struct DisplaySettings {
    pub tz: Tz,
    pub stale_after: Duration,
    pub low_battery_percent: i32,
}

impl DisplaySettings {
    /// Unknown zone names fall back to UTC.
    pub fn new(tz_name: &str, stale_after_secs: u64, low_battery_percent: i32) -> Self {
        let tz = tz_name.parse::<Tz>().unwrap_or_else(|e| {
            error!(timezone = tz_name, error = %e, "failed to load location; using UTC");
            Tz::UTC
        });
        Self {
            tz,
            stale_after: Duration::seconds(stale_after_secs.min(MAX_STALE_SECS) as i64),
            low_battery_percent,
        }
    }
}

/// `error` (stale) wins over `battery` (low); empty when all is well.
pub fn sensor_class(reading: &SensorReading, now: DateTime<Utc>, d: &DisplaySettings) -> &'static str {
    if now.signed_duration_since(reading.timestamp) > d.stale_after {
        "error"
    } else if reading.battery < d.low_battery_percent {
        "battery"
    } else {
        ""
    }
}

pub fn temperature(reading: &SensorReading, now: DateTime<Utc>, d: &DisplaySettings) -> String {
    format!(
        "<span class='{}'>{:.1}°</span>",
        sensor_class(reading, now, d),
        reading.temperature
    )
}

pub fn humidity(reading: &SensorReading, now: DateTime<Utc>, d: &DisplaySettings) -> String {
    format!(
        "<span class='{}'>{:.0}%</span>",
        sensor_class(reading, now, d),
        reading.humidity
    )
}

fn hh_mm(t: Option<DateTime<Utc>>, d: &DisplaySettings) -> String {
    match t {
        Some(t) => t.with_timezone(&d.tz).format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

pub fn sunrise(t: Option<DateTime<Utc>>, d: &DisplaySettings) -> String {
    format!("<span>↑{}</span>", hh_mm(t, d))
}

pub fn sunset(t: Option<DateTime<Utc>>, d: &DisplaySettings) -> String {
    format!("<span>↓{}</span>", hh_mm(t, d))
}

pub fn clock(now: DateTime<Utc>, d: &DisplaySettings) -> String {
    format!("<span>{}</span>", hh_mm(Some(now), d))
}

pub fn date(now: DateTime<Utc>, d: &DisplaySettings) -> String {
    format!(
        "<span>{}</span>",
        now.with_timezone(&d.tz).format("%A %B %-d %Y")
    )
}
