//! Application state shared across handlers

use crate::config::Settings;
use crate::network::HttpClient;
use crate::vendor::VendorClient;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Location provider client
    pub vendor: Arc<VendorClient>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, client: HttpClient) -> Self {
        let vendor = Arc::new(VendorClient::new(client, settings.vendor.clone()));
        Self {
            settings: Arc::new(settings),
            vendor,
        }
    }

    /// Check if cross-origin requests are allowed
    pub fn cors_enabled(&self) -> bool {
        self.settings.server.cors
    }
}
