// src/cache/mod.rs
pub mod poller;
pub mod store;

pub use poller::{PollingCache, RefreshOutcome, Source};
pub use store::CachedValue;
