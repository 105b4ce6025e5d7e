//! Location autocomplete pipeline
//!
//! Keystrokes pass through a debounce gate, then the shared suggestion cache,
//! then a cancellable fetch whose records are normalized before being cached
//! and exposed. Only the most recently issued request may change what callers
//! observe.

mod debounce;
mod fetch;
mod orchestrator;

pub use debounce::{DebounceGate, Schedule, DEFAULT_DEBOUNCE, MIN_QUERY_LEN};
pub use fetch::{
    CancellableFetch, HttpLocationSource, LocationSource, PendingFetch, RequestHandle,
    DEFAULT_UPSTREAM_ERROR,
};
pub use orchestrator::{LocationSearch, SearchOptions, SearchPhase, SearchState};
