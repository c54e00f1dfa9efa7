//! Search result normalization
//!
//! Providers return loosely shaped JSON: keys go missing, numbers arrive as
//! strings, whole payloads arrive as JSON text. Each normalizer here turns such
//! a payload into the fixed records of [`crate::domain`] and never fails. When
//! nothing usable survives, the caller gets a clarification with follow-up
//! questions instead.

mod events;
mod flights;
mod hotels;
mod price;

use std::fmt::Display;

use serde::Deserialize;
use serde::de::{DeserializeOwned, Deserializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::Clarification;
use crate::domain::lenient::{value_to_f64, value_to_string};

pub use events::{EVENT_LIMIT, events_outcome, normalize_events, normalize_web_results};
pub use flights::normalize_flights;
pub use hotels::normalize_hotels;
pub use price::{PriceFields, RawPrice, parse_price_text, raw_price};

/// Clarification for a provider or decoding failure
pub fn provider_failure(error: impl Display) -> Clarification {
    let error = error.to_string();
    warn!(%error, "provider_failure: search failed");
    Clarification::new(
        error,
        vec!["Could you rephrase the request with a city, dates or a budget?".to_string()],
    )
}

/// Unwrap payloads that arrive as JSON text
///
/// Text that does not parse becomes `null`, which every normalizer reads as
/// "no results".
pub fn coerce_payload(raw: Value) -> Value {
    match raw {
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "coerce_payload: text payload is not JSON");
                Value::Null
            }
        },
        other => other,
    }
}

/// Deserialize any value, keeping only the object elements of an array
pub(crate) fn object_list<'de, D>(deserializer: D) -> Result<Vec<Map<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(objects(&value))
}

/// Deserialize a field that may be malformed; malformed values become `None`
pub(crate) fn tolerant<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

/// The object elements of `value` when it is an array
pub(crate) fn objects(value: &Value) -> Vec<Map<String, Value>> {
    match value {
        Value::Array(items) => items.iter().filter_map(|v| v.as_object().cloned()).collect(),
        _ => Vec::new(),
    }
}

/// First non-blank string among `keys`, accepting numbers
pub(crate) fn first_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .filter_map(value_to_string)
        .find(|s| !s.trim().is_empty())
}

/// First numeric value among `keys`, accepting numeric strings
pub(crate) fn first_f64(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(value_to_f64)
}

/// A nested object field, or an empty map
pub(crate) fn sub_object(obj: &Map<String, Value>, key: &str) -> Map<String, Value> {
    obj.get(key).and_then(Value::as_object).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_payload() {
        assert_eq!(coerce_payload(json!("{\"hotels\": []}")), json!({"hotels": []}));
        assert_eq!(coerce_payload(json!("not json")), Value::Null);
        assert_eq!(coerce_payload(json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn test_provider_failure_is_clarification() {
        let c = provider_failure("Network error: connection refused");
        assert!(c.user_prompt_needed);
        assert_eq!(c.error, "Network error: connection refused");
        assert_eq!(c.suggested_questions.len(), 1);
    }

    #[test]
    fn test_field_helpers() {
        let obj = json!({"name": "", "title": "Gala", "price": "12.5", "n": 3})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(first_string(&obj, &["name", "title"]).as_deref(), Some("Gala"));
        assert_eq!(first_string(&obj, &["n"]).as_deref(), Some("3"));
        assert_eq!(first_f64(&obj, &["missing", "price"]), Some(12.5));
        assert!(sub_object(&obj, "venue").is_empty());
        assert_eq!(objects(&json!([{"a": 1}, 2, "x", {"b": 2}])).len(), 2);
    }
}
