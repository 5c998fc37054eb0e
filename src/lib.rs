// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod almanac;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod sensor;
pub mod shutdown;
pub mod snippets;
pub mod transport;

// ---- Re-exports for stable public API ----
pub use crate::almanac::{Almanac, AlmanacResults};
pub use crate::api::{create_router, AppState};
pub use crate::cache::RefreshOutcome;
pub use crate::error::FetchError;
pub use crate::sensor::{Sensor, SensorReading};
