//! Settings structures for TravelSearch-RS configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub outgoing: OutgoingSettings,
    pub vendor: VendorSettings,
    pub autocomplete: AutocompleteSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    fn merge_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("TRAVELSEARCH_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = lookup("TRAVELSEARCH_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = lookup("AMADEUS_CLIENT_ID") {
            self.vendor.client_id = val;
        }
        if let Some(val) = lookup("AMADEUS_CLIENT_SECRET") {
            self.vendor.client_secret = val;
        }
        if let Some(val) = lookup("AMADEUS_BASE_URL") {
            self.vendor.base_url = val;
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
    /// Allow cross-origin requests from the front-end
    pub cors: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8888,
            bind_address: "127.0.0.1".to_string(),
            cors: true,
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Pool max size
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: crate::DEFAULT_TIMEOUT as f64,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Location provider credentials and lookup options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorSettings {
    /// API base URL, without trailing slash
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Maximum records requested per lookup
    pub page_limit: u32,
    /// How long an access token is reused (seconds)
    pub token_ttl_secs: u64,
}

impl Default for VendorSettings {
    fn default() -> Self {
        Self {
            base_url: "https://test.api.amadeus.com".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            page_limit: 10,
            token_ttl_secs: 1500,
        }
    }
}

impl VendorSettings {
    /// Whether credentials have been provided
    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

/// Client-side autocomplete pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocompleteSettings {
    /// Search endpoint queried by the pipeline
    pub endpoint: String,
    /// Quiet interval before a query is dispatched (milliseconds)
    pub debounce_ms: u64,
    /// Shorter queries are never dispatched
    pub min_query_len: usize,
    /// Cached results older than this are not served (seconds)
    pub cache_ttl_secs: u64,
    pub cache_max_entries: u64,
}

impl Default for AutocompleteSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8888/locations".to_string(),
            debounce_ms: 300,
            min_query_len: 2,
            cache_ttl_secs: 300,
            cache_max_entries: 10_000,
        }
    }
}

impl AutocompleteSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
