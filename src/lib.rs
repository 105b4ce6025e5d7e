//! TravelSearch-RS: location autocomplete for a travel-booking front-end
//!
//! The library side is the autocomplete pipeline ([`LocationSearch`]): it
//! debounces keystrokes, serves repeated queries from a shared TTL cache,
//! cancels superseded requests and normalizes upstream records into
//! [`Suggestion`]s. The binary serves the search endpoint that pipeline
//! queries, proxying the location provider.

pub mod autocomplete;
pub mod cache;
pub mod config;
pub mod locations;
pub mod network;
pub mod vendor;
pub mod web;

pub use autocomplete::{LocationSearch, SearchState};
pub use cache::SuggestionCache;
pub use config::Settings;
pub use locations::{LocationType, SearchError, Suggestion};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for outgoing requests in seconds
pub const DEFAULT_TIMEOUT: u64 = 5;
