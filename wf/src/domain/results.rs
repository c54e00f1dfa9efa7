//! Normalized search records and capability outcomes
//!
//! Every capability returns a [`CapabilityOutcome`]. The outcome serializes to
//! the same JSON the synthesis model sees, so field names here are part of the
//! model-facing contract.

use serde::{Deserialize, Serialize};

/// A resolved price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub amount: f64,
    pub currency: String,
}

impl Money {
    pub fn new(amount: f64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

/// Cabin class requested for a flight search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CabinClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    /// Google Flights `travel_class` parameter value
    pub fn travel_class(&self) -> &'static str {
        match self {
            CabinClass::Economy => "1",
            CabinClass::PremiumEconomy => "2",
            CabinClass::Business => "3",
            CabinClass::First => "4",
        }
    }
}

/// Typed fields parsed out of a free-text flight query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightQuery {
    pub origin: String,
    pub destination: String,
    /// `YYYY-MM-DD`
    pub depart_date: String,
    pub return_date: Option<String>,
    pub non_stop: bool,
    pub cabin: Option<CabinClass>,
    pub seats: u32,
    pub currency: String,
}

/// One segment of a flight itinerary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightLeg {
    pub airline: Option<String>,
    pub flight_number: Option<String>,
    pub departure_airport: Option<String>,
    pub departure_time: Option<String>,
    pub arrival_airport: Option<String>,
    pub arrival_time: Option<String>,
    pub duration: Option<String>,
    pub layovers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingLink {
    pub provider: Option<String>,
    pub link: Option<String>,
    pub price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOption {
    pub title: String,
    pub total_price: Option<Money>,
    pub price_text: Option<String>,
    pub currency: String,
    pub out_duration: Option<String>,
    pub ret_duration: Option<String>,
    pub legs_out: Vec<FlightLeg>,
    pub booking_links: Vec<BookingLink>,
}

/// Flight results grouped the way Google Flights groups them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightBuckets {
    pub best: Vec<FlightOption>,
    pub other: Vec<FlightOption>,
    pub best_return: Vec<FlightOption>,
    pub other_return: Vec<FlightOption>,
}

impl FlightBuckets {
    pub fn is_empty(&self) -> bool {
        self.best.is_empty() && self.other.is_empty() && self.best_return.is_empty() && self.other_return.is_empty()
    }

    /// All options with their bucket name, in bucket order
    pub fn labeled(&self) -> impl Iterator<Item = (&'static str, &FlightOption)> {
        self.best
            .iter()
            .map(|f| ("best", f))
            .chain(self.other.iter().map(|f| ("other", f)))
            .chain(self.best_return.iter().map(|f| ("best_return", f)))
            .chain(self.other_return.iter().map(|f| ("other_return", f)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub name: String,
    pub description: Option<String>,
    pub price_per_night: Option<f64>,
    pub price_text: Option<String>,
    pub currency: String,
    pub rating: Option<f64>,
    pub reviews: Option<u64>,
    pub amenities: Vec<String>,
    pub link: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub neighborhood: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub venue: Venue,
    pub price: Option<f64>,
    pub price_text: Option<String>,
    pub currency: String,
    pub link: Option<String>,
    pub source: String,
}

/// Signal that a capability needs more input from the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clarification {
    pub error: String,
    pub user_prompt_needed: bool,
    pub suggested_questions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_parsed: Option<FlightQuery>,
}

impl Clarification {
    pub fn new(error: impl Into<String>, suggested_questions: Vec<String>) -> Self {
        Self {
            error: error.into(),
            user_prompt_needed: true,
            suggested_questions,
            query_parsed: None,
        }
    }

    pub fn with_query(mut self, query: FlightQuery) -> Self {
        self.query_parsed = Some(query);
        self
    }
}

/// Result of one capability invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapabilityOutcome {
    Flights {
        query_parsed: FlightQuery,
        results: FlightBuckets,
    },
    Hotels {
        hotels: Vec<Hotel>,
    },
    Events {
        events: Vec<Event>,
    },
    Clarification(Clarification),
}

impl CapabilityOutcome {
    pub fn clarification(error: impl Into<String>, suggested_questions: Vec<String>) -> Self {
        CapabilityOutcome::Clarification(Clarification::new(error, suggested_questions))
    }

    pub fn is_clarification(&self) -> bool {
        matches!(self, CapabilityOutcome::Clarification(_))
    }

    /// Follow-up questions carried by a clarification; empty otherwise
    pub fn suggested_questions(&self) -> &[String] {
        match self {
            CapabilityOutcome::Clarification(c) => &c.suggested_questions,
            _ => &[],
        }
    }

    /// Short human-readable summary for logs
    pub fn summary(&self) -> String {
        match self {
            CapabilityOutcome::Flights { results, .. } => {
                format!("{} flight option(s)", results.labeled().count())
            }
            CapabilityOutcome::Hotels { hotels } => format!("{} hotel(s)", hotels.len()),
            CapabilityOutcome::Events { events } => format!("{} event(s)", events.len()),
            CapabilityOutcome::Clarification(c) => c.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hotel(name: &str) -> Hotel {
        Hotel {
            name: name.to_string(),
            description: None,
            price_per_night: Some(129.0),
            price_text: Some("$129".to_string()),
            currency: "USD".to_string(),
            rating: Some(4.2),
            reviews: None,
            amenities: vec![],
            link: None,
            latitude: None,
            longitude: None,
            address: None,
            neighborhood: None,
        }
    }

    #[test]
    fn test_clarification_serializes_flat() {
        let outcome = CapabilityOutcome::clarification("No hotels found", vec!["Budget?".to_string()]);
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["user_prompt_needed"], true);
        assert_eq!(value["error"], "No hotels found");
        assert!(value.get("query_parsed").is_none());
        assert_eq!(outcome.suggested_questions(), ["Budget?".to_string()]);
    }

    #[test]
    fn test_hotels_outcome_shape() {
        let outcome = CapabilityOutcome::Hotels {
            hotels: vec![hotel("Budget Inn")],
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["hotels"][0]["name"], "Budget Inn");
        assert!(!outcome.is_clarification());
        assert!(outcome.suggested_questions().is_empty());
    }

    #[test]
    fn test_outcome_decodes_clarification_with_query() {
        let value = json!({
            "error": "No flights found for the given parameters",
            "user_prompt_needed": true,
            "suggested_questions": ["Are you open to connections or different times?"],
            "query_parsed": {
                "origin": "OAK", "destination": "SEA", "depart_date": "2025-11-21",
                "return_date": null, "non_stop": false, "cabin": null, "seats": 1, "currency": "USD"
            }
        });
        let outcome: CapabilityOutcome = serde_json::from_value(value).unwrap();
        match outcome {
            CapabilityOutcome::Clarification(c) => {
                assert_eq!(c.query_parsed.unwrap().destination, "SEA");
            }
            other => panic!("expected clarification, got {:?}", other),
        }
    }

    #[test]
    fn test_cabin_serializes_screaming() {
        assert_eq!(
            serde_json::to_value(CabinClass::PremiumEconomy).unwrap(),
            json!("PREMIUM_ECONOMY")
        );
        assert_eq!(CabinClass::Business.travel_class(), "3");
    }

    #[test]
    fn test_buckets_labeled_order() {
        let option = FlightOption {
            title: "Best departing flights".to_string(),
            total_price: Some(Money::new(245.0, "USD")),
            price_text: Some("$245".to_string()),
            currency: "USD".to_string(),
            out_duration: Some("135".to_string()),
            ret_duration: None,
            legs_out: vec![],
            booking_links: vec![],
        };
        let buckets = FlightBuckets {
            best: vec![option.clone()],
            other_return: vec![option],
            ..Default::default()
        };
        let labels: Vec<_> = buckets.labeled().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["best", "other_return"]);
        assert!(!buckets.is_empty());
        assert!(FlightBuckets::default().is_empty());
    }
}
