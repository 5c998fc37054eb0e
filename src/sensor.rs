// src/sensor.rs
//! Sensor collector: temperature / humidity / battery from the eWeLink cloud,
//! refetched on every tick.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

use crate::cache::{PollingCache, RefreshOutcome, Source};
use crate::config::{SensorConfig, SensorCredentials};
use crate::error::FetchError;
use crate::shutdown::ShutdownSignal;
use crate::transport::{HttpRequest, Transport};

const NONCE_LEN: usize = 5;

/// Latest sensor values in physical units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SensorReading {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Battery level, percent.
    pub battery: i32,
    /// Local time the fetch completed; the device payload carries none.
    pub timestamp: DateTime<Utc>,
}

// Only the fields we read; the device document has many more.
#[derive(Debug, Deserialize)]
struct DeviceResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    error: String,
    #[serde(default)]
    params: DeviceParams,
}

#[derive(Debug, Default, Deserialize)]
struct DeviceParams {
    #[serde(default)]
    temperature: String,
    #[serde(default)]
    humidity: String,
    #[serde(default)]
    battery: i32,
}

/// Values arrive as strings scaled by 100 ("2150" = 21.50).
fn parse_scaled(field: &'static str, raw: &str) -> Result<f64, FetchError> {
    raw.trim()
        .parse::<f64>()
        .map(|v| v / 100.0)
        .map_err(|_| FetchError::Field {
            field,
            value: raw.to_string(),
        })
}

pub fn nonce() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(NONCE_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

pub struct SensorSource {
    transport: Arc<dyn Transport>,
    base_url: String,
    credentials: SensorCredentials,
    timeout: Duration,
}

impl SensorSource {
    pub fn new(
        transport: Arc<dyn Transport>,
        cfg: &SensorConfig,
        credentials: SensorCredentials,
    ) -> Self {
        Self {
            transport,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            credentials,
            timeout: cfg.timeout(),
        }
    }

    fn request(&self, nonce: &str, unix_ts: i64) -> HttpRequest {
        let c = &self.credentials;
        let url = format!(
            "{}/api/user/device/{}?appid={}&version=8&deviceid={}&nonce={}&ts={}",
            self.base_url, c.device_id, c.app_id, c.device_id, nonce, unix_ts
        );
        HttpRequest::get(url, self.timeout)
            .with_header("Authorization", format!("Bearer {}", c.token))
            .with_header("Content-Type", "application/json")
    }
}

#[async_trait]
impl Source for SensorSource {
    type Reading = SensorReading;

    fn name(&self) -> &'static str {
        "sensor"
    }

    async fn fetch(&self) -> Result<SensorReading, FetchError> {
        let req = self.request(&nonce(), Utc::now().timestamp());
        let resp = self.transport.get(&req).await?;
        if resp.status != 200 {
            return Err(FetchError::Status(resp.status));
        }

        let device: DeviceResponse = serde_json::from_str(&resp.body)?;
        if device.code != 0 {
            return Err(FetchError::Upstream {
                code: device.code,
                message: device.error,
            });
        }

        let temperature = parse_scaled("temperature", &device.params.temperature)?;
        let humidity = parse_scaled("humidity", &device.params.humidity)?;

        Ok(SensorReading {
            temperature,
            humidity,
            battery: device.params.battery,
            timestamp: Utc::now(),
        })
    }
}

/// Cached sensor reading.
pub struct Sensor {
    cache: PollingCache<SensorSource>,
}

impl Sensor {
    pub fn new(
        transport: Arc<dyn Transport>,
        cfg: &SensorConfig,
        credentials: SensorCredentials,
    ) -> Self {
        Self {
            cache: PollingCache::new(
                SensorSource::new(transport, cfg, credentials),
                cfg.refresh_interval(),
            ),
        }
    }

    pub async fn fetch(&self) -> RefreshOutcome {
        self.cache.refresh().await
    }

    pub async fn run(&self, shutdown: ShutdownSignal) {
        self.cache.run(shutdown).await
    }

    /// All four values from one snapshot; zeros before the first success.
    pub fn get(&self) -> SensorReading {
        self.cache.latest().map(|r| *r).unwrap_or_default()
    }

    pub fn latest(&self) -> Option<Arc<SensorReading>> {
        self.cache.latest()
    }
}
