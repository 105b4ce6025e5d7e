//! HTTP networking module
//!
//! Provides HTTP client functionality for calling the location provider and
//! the search endpoint.

mod client;
mod request;

pub use client::HttpClient;
pub use request::{HttpMethod, UpstreamRequest, UpstreamResponse};
