// src/config/mod.rs
pub mod credentials;
pub mod dashboard;

pub use credentials::SensorCredentials;
pub use dashboard::{AlmanacConfig, DashboardConfig, SensorConfig};
