//! Location type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Location-type filter attached to every query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LocationType {
    #[default]
    #[serde(alias = "ALL")]
    Any,
    City,
    Airport,
}

impl LocationType {
    /// Wire name used in query strings and cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Any => "ANY",
            LocationType::City => "CITY",
            LocationType::Airport => "AIRPORT",
        }
    }

    /// Parse leniently: missing or unknown values mean `Any`
    pub fn parse_lenient(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ANY" | "ALL" => Ok(LocationType::Any),
            "CITY" => Ok(LocationType::City),
            "AIRPORT" => Ok(LocationType::Airport),
            other => Err(format!("unknown location type: {}", other)),
        }
    }
}

/// Classification of a suggestion; the UI branches only on these two values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LocationKind {
    Airport,
    City,
}

impl LocationKind {
    /// Match an upstream subtype verbatim
    pub fn from_subtype(subtype: &str) -> Option<Self> {
        match subtype {
            "AIRPORT" => Some(LocationKind::Airport),
            "CITY" => Some(LocationKind::City),
            _ => None,
        }
    }
}

/// Record as returned by the upstream search endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iata_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<RawAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics: Option<RawAnalytics>,
}

impl RawRecord {
    pub fn city_name(&self) -> Option<&str> {
        self.address.as_ref().and_then(|a| a.city_name.as_deref())
    }

    pub fn country_name(&self) -> Option<&str> {
        self.address.as_ref().and_then(|a| a.country_name.as_deref())
    }

    /// Popularity score, `analytics.travelers.score`
    pub fn score(&self) -> Option<f64> {
        self.analytics
            .as_ref()
            .and_then(|a| a.travelers.as_ref())
            .and_then(|t| t.score)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAnalytics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travelers: Option<RawTravelers>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTravelers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// One candidate place, ready for display
///
/// Suggestions keep upstream ordering; `score` is informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Opaque, upstream-assigned identifier
    pub id: String,
    /// Title-cased canonical name
    pub name: String,
    /// Name plus city and country when distinct
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: LocationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iata_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}
