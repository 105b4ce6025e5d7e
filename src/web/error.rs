//! HTTP error responses

use crate::vendor::VendorError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Query must be at least 2 characters long")]
    QueryTooShort,

    #[error("Failed to authenticate with location provider")]
    Authentication(String),

    #[error("Location search failed")]
    Lookup(String),

    #[error("Hotel list search failed")]
    HotelList { status: u16, details: String },

    #[error("Hotel search failed")]
    HotelOffers { status: u16, details: String },

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    fn details(&self) -> Option<&str> {
        match self {
            ApiError::QueryTooShort => None,
            ApiError::Authentication(details)
            | ApiError::Lookup(details)
            | ApiError::Internal(details)
            | ApiError::HotelList { details, .. }
            | ApiError::HotelOffers { details, .. } => Some(details),
        }
    }

    /// Status the provider answered with, when it rejected the request
    fn upstream_status(&self) -> Option<u16> {
        match self {
            ApiError::HotelList { status, .. } | ApiError::HotelOffers { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<VendorError> for ApiError {
    fn from(err: VendorError) -> Self {
        match err {
            VendorError::MissingCredentials => ApiError::Authentication(err.to_string()),
            VendorError::Auth { details, .. } => ApiError::Authentication(details),
            VendorError::Lookup { details, .. } => ApiError::Lookup(details),
            VendorError::HotelList { status, details } => ApiError::HotelList { status, details },
            VendorError::HotelOffers { status, details } => ApiError::HotelOffers { status, details },
            VendorError::Malformed(_) | VendorError::Transport(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::QueryTooShort | ApiError::HotelList { .. } | ApiError::HotelOffers { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Authentication(_) | ApiError::Lookup(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let mut body = json!({ "error": self.to_string() });
        if let Some(details) = self.details() {
            body["details"] = json!(details);
        }
        if let Some(upstream) = self.upstream_status() {
            body["status"] = json!(upstream);
        }

        (status, Json(body)).into_response()
    }
}
