// src/config/credentials.rs
use anyhow::{anyhow, Result};
use std::env;

pub const ENV_APP_ID: &str = "EWELINK_APP_ID";
pub const ENV_DEVICE_ID: &str = "EWELINK_DEVICE_ID";
pub const ENV_TOKEN: &str = "EWELINK_TOKEN";

/// Sensor cloud credentials. Read from env only; never from the TOML file.
#[derive(Clone, PartialEq, Eq)]
pub struct SensorCredentials {
    pub app_id: String,
    pub device_id: String,
    pub token: String,
}

// Keep the bearer token out of logs.
impl std::fmt::Debug for SensorCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorCredentials")
            .field("app_id", &self.app_id)
            .field("device_id", &self.device_id)
            .field("token_len", &self.token.len())
            .finish()
    }
}

impl SensorCredentials {
    /// All three variables are required; a missing or blank one is fatal for
    /// the sensor collector.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            app_id: required(ENV_APP_ID)?,
            device_id: required(ENV_DEVICE_ID)?,
            token: required(ENV_TOKEN)?,
        })
    }
}

fn required(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(anyhow!("Missing {name} env var")),
    }
}
