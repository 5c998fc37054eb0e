// src/config/dashboard.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "DASHBOARD_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard.toml";

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}
fn default_display_timezone() -> String {
    "Europe/Paris".to_string()
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// IANA zone used to format times in the HTML fragments.
    #[serde(default = "default_display_timezone")]
    pub display_timezone: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default)]
    pub almanac: AlmanacConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            display_timezone: default_display_timezone(),
            static_dir: default_static_dir(),
            almanac: AlmanacConfig::default(),
            sensor: SensorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlmanacConfig {
    pub base_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub refresh_interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for AlmanacConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.sunrisesunset.io/json".to_string(),
            latitude: 48.744760,
            longitude: -0.962368,
            refresh_interval_secs: 60,
            timeout_secs: 30,
        }
    }
}

impl AlmanacConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub base_url: String,
    pub refresh_interval_secs: u64,
    pub timeout_secs: u64,
    /// Readings older than this render with the `error` class.
    pub stale_after_secs: u64,
    /// Battery below this percentage renders with the `battery` class.
    pub low_battery_percent: i32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://eu-api.coolkit.cc:8080".to_string(),
            refresh_interval_secs: 300,
            timeout_secs: 30,
            stale_after_secs: 600,
            low_battery_percent: 20,
        }
    }
}

impl SensorConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl DashboardConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing dashboard config")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading dashboard config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load config using env var + fallbacks:
    /// 1) $DASHBOARD_CONFIG_PATH (must exist)
    /// 2) config/dashboard.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!(
                    "{ENV_CONFIG_PATH} points to non-existent path {}",
                    pb.display()
                ));
            }
            return Self::load_from(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        Ok(Self::default())
    }
}
