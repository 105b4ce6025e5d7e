//! Mapping of raw upstream records into suggestions

use super::types::{LocationKind, RawRecord, Suggestion};
use thiserror::Error;
use tracing::debug;

/// Reasons a raw record is dropped from the result list
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("unrecognized location subtype: {0:?}")]
    UnknownSubtype(Option<String>),
}

/// Title-case every space-separated word
///
/// Lowercases the whole string, then uppercases the first character of each
/// word. Runs of spaces are preserved.
pub fn title_case(text: &str) -> String {
    text.to_lowercase()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the human-readable label from already formatted parts
pub fn display_name(name: &str, city: Option<&str>, country: Option<&str>) -> String {
    let mut display = name.to_string();
    if let Some(city) = city {
        if city != name {
            display.push_str(", ");
            display.push_str(city);
        }
    }
    if let Some(country) = country {
        display.push_str(", ");
        display.push_str(country);
    }
    display
}

/// Normalize one raw record
pub fn normalize(raw: &RawRecord) -> Result<Suggestion, NormalizeError> {
    let kind = raw
        .sub_type
        .as_deref()
        .and_then(LocationKind::from_subtype)
        .ok_or_else(|| NormalizeError::UnknownSubtype(raw.sub_type.clone()))?;

    let name = title_case(&raw.name);
    let city_name = non_empty(raw.city_name()).map(title_case);
    let country_name = non_empty(raw.country_name()).map(title_case);
    let display_name = display_name(&name, city_name.as_deref(), country_name.as_deref());

    Ok(Suggestion {
        id: raw.id.clone(),
        name,
        display_name,
        kind,
        iata_code: raw.iata_code.clone(),
        city_name,
        country_name,
        score: raw.score(),
    })
}

/// Normalize a record list, keeping upstream order and dropping rejected records
pub fn normalize_all(records: &[RawRecord]) -> Vec<Suggestion> {
    records
        .iter()
        .filter_map(|record| match normalize(record) {
            Ok(suggestion) => Some(suggestion),
            Err(e) => {
                debug!("Dropping location {}: {}", record.id, e);
                None
            }
        })
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
