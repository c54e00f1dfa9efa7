//! Itinerary items, map locations and selectable options

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::lenient;

/// Category of an itinerary item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ItemType {
    Travel,
    Lodging,
    #[default]
    Activity,
}

impl From<String> for ItemType {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "travel" | "flight" | "transport" => ItemType::Travel,
            "lodging" | "hotel" | "accommodation" => ItemType::Lodging,
            _ => ItemType::Activity,
        }
    }
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Travel => "travel",
            ItemType::Lodging => "lodging",
            ItemType::Activity => "activity",
        }
    }
}

/// A scheduled entry in the itinerary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItineraryItem {
    /// Stable id; blank until the integrity pass assigns one
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,

    /// ISO-8601 local timestamp, e.g. `2025-11-21T10:00:00`
    #[serde(rename = "startTime", default, deserialize_with = "lenient::string")]
    pub start_time: String,

    #[serde(
        rename = "endTime",
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<String>,

    #[serde(rename = "type", default)]
    pub item_type: ItemType,

    /// Opaque flight/hotel/event payload
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

impl ItineraryItem {
    /// Create an item with the fields the scheduler cares about
    pub fn new(title: impl Into<String>, start_time: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            title: title.into(),
            start_time: start_time.into(),
            item_type,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_end(mut self, end_time: impl Into<String>) -> Self {
        self.end_time = Some(end_time.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A map marker tied to an itinerary item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,

    #[serde(deserialize_with = "lenient::float")]
    pub latitude: f64,

    #[serde(deserialize_with = "lenient::float")]
    pub longitude: f64,

    #[serde(rename = "linkedItineraryId", default, deserialize_with = "lenient::string")]
    pub linked_itinerary_id: String,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64, linked_itinerary_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            linked_itinerary_id: linked_itinerary_id.into(),
        }
    }
}

/// Kind of selectable option
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum OptionKind {
    Flight,
    Hotel,
    #[default]
    Event,
}

impl From<String> for OptionKind {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "flight" | "flights" => OptionKind::Flight,
            "hotel" | "hotels" | "lodging" => OptionKind::Hotel,
            _ => OptionKind::Event,
        }
    }
}

impl OptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKind::Flight => "flight",
            OptionKind::Hotel => "hotel",
            OptionKind::Event => "event",
        }
    }
}

/// A selectable alternative that is not committed to the itinerary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripOption {
    #[serde(default, deserialize_with = "lenient::string")]
    pub option_id: String,

    #[serde(rename = "type", default)]
    pub kind: OptionKind,

    #[serde(default, deserialize_with = "lenient::string")]
    pub category: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,

    /// Normalized search record this option was built from
    #[serde(default)]
    pub data: Value,

    /// Item this option would replace if selected
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub replaces_itinerary_id: Option<String>,
}

/// Decode a JSON array element by element, keeping what decodes
///
/// Returns the decoded records and one log line per rejected element.
pub fn decode_each<T>(values: &[Value], label: &str) -> (Vec<T>, Vec<String>)
where
    T: serde::de::DeserializeOwned,
{
    debug!(count = values.len(), %label, "decode_each: called");
    let mut decoded = Vec::with_capacity(values.len());
    let mut rejected = Vec::new();

    for (idx, value) in values.iter().enumerate() {
        match serde_json::from_value::<T>(value.clone()) {
            Ok(record) => decoded.push(record),
            Err(e) => {
                debug!(%idx, error = %e, "decode_each: element rejected");
                rejected.push(format!("dropped invalid {} #{}: {}", label, idx, e));
            }
        }
    }

    (decoded, rejected)
}
