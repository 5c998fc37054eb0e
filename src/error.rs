// src/error.rs
//! Fetch error taxonomy shared by both collectors.
//!
//! Every variant is transient: the collector logs it, keeps its cached reading,
//! and tries again on the next tick.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("executing fetch request: {0}")]
    Transport(String),

    #[error("unexpected status: {0}")]
    Status(u16),

    #[error("decoding response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("upstream error (code={code}): {message}")]
    Upstream { code: i64, message: String },

    #[error("parsing {field}: {value:?}")]
    Field { field: &'static str, value: String },
}

impl FetchError {
    /// Short label used as the `reason` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Status(_) => "status",
            FetchError::Decode(_) => "decode",
            FetchError::Upstream { .. } => "upstream",
            FetchError::Field { .. } => "field",
        }
    }
}
