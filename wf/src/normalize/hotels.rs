//! Hotel search normalization

use serde_json::{Map, Value};
use tracing::debug;

use super::{first_f64, first_string, objects, raw_price, sub_object};
use crate::domain::lenient::value_to_string;
use crate::domain::{CapabilityOutcome, Hotel};

/// Properties considered from a response
const CONSIDERED: usize = 8;
/// Hotels kept after normalization
const KEPT: usize = 5;

fn normalize_property(p: &Map<String, Value>) -> Option<Hotel> {
    let name = first_string(p, &["name"])?;

    let price = raw_price(
        p.get("rate_per_night")
            .filter(|v| !v.is_null())
            .or_else(|| p.get("price")),
    );
    let currency = price
        .as_ref()
        .and_then(|pr| pr.currency())
        .or_else(|| first_string(p, &["currency"]))
        .unwrap_or_else(|| "USD".to_string());
    let price_per_night = price
        .as_ref()
        .and_then(|pr| pr.money(&currency))
        .map(|m| m.amount)
        .or_else(|| first_f64(p, &["extracted_price"]));
    let price_text = price
        .as_ref()
        .and_then(|pr| pr.text())
        .or_else(|| first_string(p, &["price_qualifier"]))
        .or_else(|| price_per_night.map(|amount| format!("{} {}", amount, currency)));

    let coords = sub_object(p, "gps_coordinates");
    let amenities = p
        .get("amenities")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(value_to_string).collect())
        .unwrap_or_default();

    Some(Hotel {
        name,
        description: first_string(p, &["description"]),
        price_per_night,
        price_text,
        currency,
        rating: first_f64(p, &["overall_rating", "rating"]),
        reviews: first_f64(p, &["reviews"]).filter(|r| *r >= 0.0).map(|r| r as u64),
        amenities,
        link: first_string(p, &["link", "all_options_link", "booking_link"]),
        latitude: first_f64(&coords, &["latitude"]),
        longitude: first_f64(&coords, &["longitude"]),
        address: first_string(p, &["address"]),
        neighborhood: first_string(p, &["neighborhood"]),
    })
}

/// Normalize a Google Hotels payload
pub fn normalize_hotels(raw: &Value) -> CapabilityOutcome {
    let properties = raw.get("properties").map(objects).unwrap_or_default();
    debug!(count = properties.len(), "normalize_hotels: called");

    let hotels: Vec<Hotel> = properties
        .iter()
        .take(CONSIDERED)
        .filter_map(normalize_property)
        .take(KEPT)
        .collect();

    if hotels.is_empty() {
        debug!("normalize_hotels: no usable properties");
        return CapabilityOutcome::clarification(
            "No hotels found for that query",
            vec![
                "What's your nightly budget cap (USD)?".to_string(),
                "Do you want downtown or near the airport?".to_string(),
                "Do you prefer 3★, 4★, or 5★?".to_string(),
            ],
        );
    }
    CapabilityOutcome::Hotels { hotels }
}
