//! HTTP request handlers

use super::error::ApiError;
use super::state::AppState;
use crate::autocomplete::MIN_QUERY_LEN;
use crate::locations::{LocationType, RawRecord};
use crate::vendor::{HotelListing, HotelQuery};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Query parameters for location search
#[derive(Debug, Deserialize)]
pub struct LocationParams {
    /// Search text
    #[serde(alias = "q")]
    pub query: Option<String>,
    /// ANY (or ALL), CITY, AIRPORT
    #[serde(rename = "type")]
    pub location_type: Option<String>,
}

/// Location search response
#[derive(Debug, Serialize, Deserialize)]
pub struct LocationSearchResponse {
    pub success: bool,
    pub data: Vec<RawRecord>,
    pub meta: SearchMeta,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchMeta {
    pub count: usize,
    pub query: String,
}

/// Location search handler
pub async fn location_search(
    State(state): State<AppState>,
    Query(params): Query<LocationParams>,
) -> Result<Json<LocationSearchResponse>, ApiError> {
    let query = params.query.unwrap_or_default();
    if query.chars().count() < MIN_QUERY_LEN {
        return Err(ApiError::QueryTooShort);
    }

    let location_type = LocationType::parse_lenient(params.location_type.as_deref());
    let data = state
        .vendor
        .search_locations(&query, location_type)
        .await
        .map_err(|e| {
            error!("Location search error: {}", e);
            ApiError::from(e)
        })?;

    info!("Location search {:?} ({}) returned {}", query, location_type, data.len());

    Ok(Json(LocationSearchResponse {
        success: true,
        meta: SearchMeta {
            count: data.len(),
            query,
        },
        data,
    }))
}

/// Query parameters for hotel search; omitted fields take [`HotelQuery`] defaults
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelParams {
    pub city_code: Option<String>,
    pub check_in_date: Option<String>,
    pub check_out_date: Option<String>,
    pub adults: Option<u32>,
    pub radius: Option<u32>,
    pub radius_unit: Option<String>,
    pub hotel_source: Option<String>,
}

impl From<HotelParams> for HotelQuery {
    fn from(params: HotelParams) -> Self {
        let defaults = HotelQuery::default();
        Self {
            city_code: params.city_code.unwrap_or(defaults.city_code),
            check_in_date: params.check_in_date.unwrap_or(defaults.check_in_date),
            check_out_date: params.check_out_date.unwrap_or(defaults.check_out_date),
            adults: params.adults.unwrap_or(defaults.adults),
            radius: params.radius.unwrap_or(defaults.radius),
            radius_unit: params.radius_unit.unwrap_or(defaults.radius_unit),
            hotel_source: params.hotel_source.unwrap_or(defaults.hotel_source),
        }
    }
}

/// Hotel search response
#[derive(Debug, Serialize, Deserialize)]
pub struct HotelSearchResponse {
    pub success: bool,
    pub data: Vec<HotelListing>,
    pub meta: HotelMeta,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelMeta {
    pub count: usize,
    pub city_code: String,
    pub check_in_date: String,
    pub check_out_date: String,
    pub adults: u32,
    pub hotels_found: usize,
    pub hotels_with_offers: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Hotel search handler
pub async fn hotel_search(
    State(state): State<AppState>,
    Query(params): Query<HotelParams>,
) -> Result<Json<HotelSearchResponse>, ApiError> {
    let query = HotelQuery::from(params);
    let result = state.vendor.search_hotels(&query).await.map_err(|e| {
        error!("Hotel search error: {}", e);
        ApiError::from(e)
    })?;

    info!(
        "Hotel search in {} returned {} of {} hotels",
        query.city_code,
        result.listings.len(),
        result.hotels_found
    );

    let message = (result.hotels_found == 0).then(|| "No hotels found in this city".to_string());

    Ok(Json(HotelSearchResponse {
        success: true,
        meta: HotelMeta {
            count: result.listings.len(),
            city_code: query.city_code,
            check_in_date: query.check_in_date,
            check_out_date: query.check_out_date,
            adults: query.adults,
            hotels_found: result.hotels_found,
            hotels_with_offers: result.hotels_with_offers,
            message,
        },
        data: result.listings,
    }))
}

/// Provider connectivity check
pub async fn vendor_status(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let token = state.vendor.request_token().await.map_err(|e| {
        error!("Provider connectivity check failed: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(serde_json::json!({
        "success": true,
        "token_type": token.token_type,
        "expires_in": token.expires_in,
    })))
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}
