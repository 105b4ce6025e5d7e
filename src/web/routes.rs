//! Route definitions

use super::handlers;
use super::state::AppState;
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        // Search endpoint consumed by the autocomplete pipeline
        .route("/locations", get(handlers::location_search))
        .route("/api/location-search", get(handlers::location_search))
        // API routes
        .route("/api/hotels-search", get(handlers::hotel_search))
        .route("/api/vendor-status", get(handlers::vendor_status))
        .route("/health", get(handlers::health));

    let router = if state.cors_enabled() {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router.layer(cors)
    } else {
        router
    };

    router.with_state(state)
}
