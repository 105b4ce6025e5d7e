//! Web server module
//!
//! Serves the location and hotel search endpoints in front of the provider.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use handlers::{HotelParams, HotelSearchResponse, LocationParams, LocationSearchResponse};
pub use routes::create_router;
pub use state::AppState;
