//! Location data model
//!
//! Raw upstream records, the normalized suggestion shape consumed by the UI,
//! and the errors shared by the autocomplete pipeline.

mod normalize;
mod types;

pub use normalize::{display_name, normalize, normalize_all, title_case, NormalizeError};
pub use types::*;

use thiserror::Error;

/// Failure of a location search as seen by the autocomplete pipeline
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    /// Non-2xx status or malformed body from the search endpoint
    #[error("{0}")]
    Upstream(String),

    /// Transport-level failure (timeout, DNS, connection refused)
    #[error("{0}")]
    Network(String),

    /// Superseded by a newer request; never shown to callers
    #[error("request superseded")]
    Cancelled,
}

impl SearchError {
    /// Whether this error must be suppressed rather than surfaced
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SearchError::Cancelled)
    }
}
