//! Flight search normalization

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::{first_string, object_list, objects, raw_price, tolerant};
use crate::domain::lenient::value_to_string;
use crate::domain::{BookingLink, CapabilityOutcome, Clarification, FlightBuckets, FlightLeg, FlightOption, FlightQuery};

const PER_BUCKET: usize = 3;
const BOOKING_LINKS: usize = 2;

/// Bucket keys in both normalized and raw Google Flights spelling
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BucketFields {
    #[serde(deserialize_with = "object_list")]
    best: Vec<Map<String, Value>>,
    #[serde(deserialize_with = "object_list")]
    other: Vec<Map<String, Value>>,
    #[serde(deserialize_with = "object_list")]
    best_return: Vec<Map<String, Value>>,
    #[serde(deserialize_with = "object_list")]
    other_return: Vec<Map<String, Value>>,
    #[serde(deserialize_with = "object_list")]
    best_flights: Vec<Map<String, Value>>,
    #[serde(deserialize_with = "object_list")]
    other_flights: Vec<Map<String, Value>>,
    #[serde(deserialize_with = "object_list")]
    best_return_flights: Vec<Map<String, Value>>,
    #[serde(deserialize_with = "object_list")]
    other_return_flights: Vec<Map<String, Value>>,
}

type RawBuckets = [Vec<Map<String, Value>>; 4];

impl BucketFields {
    /// Normalized keys win; raw keys are read only when those are all empty
    fn into_buckets(self) -> RawBuckets {
        let normalized = [self.best, self.other, self.best_return, self.other_return];
        if normalized.iter().any(|b| !b.is_empty()) {
            normalized
        } else {
            [
                self.best_flights,
                self.other_flights,
                self.best_return_flights,
                self.other_return_flights,
            ]
        }
    }
}

/// The shapes a flight payload arrives in
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FlightPayload {
    List(Vec<Value>),
    Wrapped { results: Map<String, Value> },
    Buckets(BucketFields),
    Unrecognized(Value),
}

impl FlightPayload {
    fn into_buckets(self) -> RawBuckets {
        match self {
            FlightPayload::List(items) => [objects(&Value::Array(items)), Vec::new(), Vec::new(), Vec::new()],
            FlightPayload::Wrapped { results } => serde_json::from_value::<BucketFields>(Value::Object(results))
                .map(BucketFields::into_buckets)
                .unwrap_or_default(),
            FlightPayload::Buckets(fields) => fields.into_buckets(),
            FlightPayload::Unrecognized(value) => {
                debug!(kind = %json_kind(&value), "FlightPayload::into_buckets: unrecognized payload");
                Default::default()
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// An airport given as a bare code or as an object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AirportRef {
    Code(String),
    Detailed(AirportFields),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AirportFields {
    code: Option<Value>,
    id: Option<Value>,
    iata: Option<Value>,
    name: Option<Value>,
    time: Option<Value>,
}

impl AirportRef {
    fn label(&self) -> Option<String> {
        match self {
            AirportRef::Code(code) => Some(code.clone()).filter(|c| !c.trim().is_empty()),
            AirportRef::Detailed(fields) => [&fields.code, &fields.id, &fields.iata, &fields.name]
                .into_iter()
                .flatten()
                .filter_map(value_to_string)
                .find(|s| !s.trim().is_empty()),
        }
    }

    fn time(&self) -> Option<String> {
        match self {
            AirportRef::Code(_) => None,
            AirportRef::Detailed(fields) => fields.time.as_ref().and_then(value_to_string),
        }
    }
}

/// One raw Google Flights segment
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSegment {
    #[serde(deserialize_with = "tolerant")]
    departure_airport: Option<AirportRef>,
    #[serde(deserialize_with = "tolerant")]
    from: Option<AirportRef>,
    #[serde(deserialize_with = "tolerant")]
    departure: Option<AirportRef>,
    #[serde(deserialize_with = "tolerant")]
    arrival_airport: Option<AirportRef>,
    #[serde(deserialize_with = "tolerant")]
    to: Option<AirportRef>,
    #[serde(deserialize_with = "tolerant")]
    arrival: Option<AirportRef>,
    airline: Option<Value>,
    #[serde(deserialize_with = "tolerant")]
    carrier: Option<Map<String, Value>>,
    #[serde(deserialize_with = "tolerant")]
    operating_carrier: Option<Map<String, Value>>,
    #[serde(deserialize_with = "tolerant")]
    flight: Option<Map<String, Value>>,
    flight_number: Option<Value>,
    number: Option<Value>,
    departure_time: Option<Value>,
    arrival_time: Option<Value>,
    duration: Option<Value>,
    stops: Option<Value>,
    layovers: Option<Value>,
}

impl RawSegment {
    fn into_leg(self) -> FlightLeg {
        let carrier = self.carrier.unwrap_or_default();
        let operating = self.operating_carrier.unwrap_or_default();
        let flight = self.flight.unwrap_or_default();

        let airline_name = self
            .airline
            .as_ref()
            .and_then(value_to_string)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| first_string(&carrier, &["name"]))
            .or_else(|| first_string(&operating, &["name"]));
        let airline_code =
            first_string(&carrier, &["iata", "code"]).or_else(|| first_string(&operating, &["iata"]));

        let number = [&self.flight_number, &self.number]
            .into_iter()
            .flatten()
            .filter_map(value_to_string)
            .find(|s| !s.trim().is_empty())
            .or_else(|| first_string(&flight, &["number", "code"]));
        let flight_number = number.map(|n| match &airline_code {
            Some(code) if !n.to_uppercase().starts_with(&code.to_uppercase()) => format!("{}{}", code, n),
            _ => n,
        });

        let dep = self.departure_airport.or(self.from).or(self.departure);
        let arr = self.arrival_airport.or(self.to).or(self.arrival);

        let departure_time = self
            .departure_time
            .as_ref()
            .and_then(value_to_string)
            .or_else(|| dep.as_ref().and_then(AirportRef::time));
        let arrival_time = self
            .arrival_time
            .as_ref()
            .and_then(value_to_string)
            .or_else(|| arr.as_ref().and_then(AirportRef::time));

        let layovers = self
            .stops
            .or(self.layovers)
            .map(|v| match v {
                Value::Array(items) => items
                    .iter()
                    .filter_map(|s| match s {
                        Value::Object(obj) => first_string(obj, &["name", "code"]),
                        other => value_to_string(other),
                    })
                    .collect(),
                _ => Vec::new(),
            })
            .unwrap_or_default();

        FlightLeg {
            airline: airline_name.or(airline_code),
            flight_number,
            departure_airport: dep.as_ref().and_then(AirportRef::label),
            departure_time,
            arrival_airport: arr.as_ref().and_then(AirportRef::label),
            arrival_time,
            duration: self.duration.as_ref().and_then(duration_text),
            layovers,
        }
    }
}

/// Durations arrive as minutes or as text; both become text
fn duration_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => n.as_f64().map(|m| format!("{}", m.round() as i64)),
        other => value_to_string(other).filter(|s| !s.trim().is_empty()),
    }
}

fn parse_legs(obj: &Map<String, Value>) -> Vec<FlightLeg> {
    let normalized: Vec<FlightLeg> = obj
        .get("legs_out")
        .map(objects)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|leg| serde_json::from_value(Value::Object(leg)).ok())
        .collect();
    if !normalized.is_empty() {
        return normalized;
    }

    obj.get("flights")
        .map(objects)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|seg| serde_json::from_value::<RawSegment>(Value::Object(seg)).ok())
        .map(RawSegment::into_leg)
        .collect()
}

fn booking_links(obj: &Map<String, Value>) -> Vec<BookingLink> {
    obj.get("booking_links")
        .map(objects)
        .unwrap_or_default()
        .iter()
        .take(BOOKING_LINKS)
        .map(|link| BookingLink {
            provider: first_string(link, &["provider_name", "provider", "type"]),
            link: first_string(link, &["link"]),
            price: link.get("price").and_then(value_to_string),
        })
        .collect()
}

fn shrink(obj: &Map<String, Value>, default_currency: &str) -> FlightOption {
    let price = raw_price(
        obj.get("price")
            .filter(|v| !v.is_null())
            .or_else(|| obj.get("total_price")),
    );
    let currency = price
        .as_ref()
        .and_then(|p| p.currency())
        .unwrap_or_else(|| default_currency.to_string());

    let out_duration = ["out_duration", "total_duration"]
        .iter()
        .filter_map(|k| obj.get(*k))
        .find_map(duration_text);
    let ret_duration = ["ret_duration", "return_total_duration"]
        .iter()
        .filter_map(|k| obj.get(*k))
        .find_map(duration_text);

    FlightOption {
        title: first_string(obj, &["title", "type"]).unwrap_or_else(|| "Departing flight".to_string()),
        total_price: price.as_ref().and_then(|p| p.money(&currency)),
        price_text: price.as_ref().and_then(|p| p.text()),
        currency,
        out_duration,
        ret_duration,
        legs_out: parse_legs(obj),
        booking_links: booking_links(obj),
    }
}

/// Normalize a flight payload for an already parsed query
pub fn normalize_flights(raw: Value, query: &FlightQuery) -> CapabilityOutcome {
    debug!(origin = %query.origin, destination = %query.destination, "normalize_flights: called");
    let payload: FlightPayload = match serde_json::from_value(raw) {
        Ok(payload) => payload,
        Err(e) => {
            debug!(error = %e, "normalize_flights: undecodable payload");
            FlightPayload::Unrecognized(Value::Null)
        }
    };

    let [best, other, best_return, other_return] = payload.into_buckets();
    let take = |bucket: Vec<Map<String, Value>>| -> Vec<FlightOption> {
        bucket
            .iter()
            .take(PER_BUCKET)
            .map(|f| shrink(f, &query.currency))
            .collect()
    };
    let results = FlightBuckets {
        best: take(best),
        other: take(other),
        best_return: take(best_return),
        other_return: take(other_return),
    };

    if results.is_empty() {
        debug!("normalize_flights: no usable flights");
        return CapabilityOutcome::Clarification(
            Clarification::new(
                "No flights found for the given parameters",
                vec![
                    "Are you open to connections or different times?".to_string(),
                    "What's your max budget for flights?".to_string(),
                    "Should I expand the date window by ±1 day?".to_string(),
                ],
            )
            .with_query(query.clone()),
        );
    }

    debug!(count = results.labeled().count(), "normalize_flights: normalized");
    CapabilityOutcome::Flights {
        query_parsed: query.clone(),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Money;
    use serde_json::json;

    fn query() -> FlightQuery {
        FlightQuery {
            origin: "OAK".to_string(),
            destination: "SEA".to_string(),
            depart_date: "2025-11-21".to_string(),
            return_date: None,
            non_stop: false,
            cabin: None,
            seats: 1,
            currency: "USD".to_string(),
        }
    }

    fn buckets(outcome: CapabilityOutcome) -> FlightBuckets {
        match outcome {
            CapabilityOutcome::Flights { results, .. } => results,
            other => panic!("expected flights, got {:?}", other),
        }
    }

    #[test]
    fn test_raw_serpapi_shape() {
        let raw = json!({
            "best_flights": [{
                "flights": [{
                    "departure_airport": {"name": "Oakland International", "id": "OAK", "time": "2025-11-21 08:05"},
                    "arrival_airport": {"name": "Seattle-Tacoma International", "id": "SEA", "time": "2025-11-21 10:15"},
                    "duration": 130,
                    "airline": "Alaska",
                    "flight_number": "AS 1421"
                }],
                "total_duration": 130,
                "price": 189,
                "type": "One way"
            }],
            "other_flights": [{"price": "$240"}]
        });
        let results = buckets(normalize_flights(raw, &query()));
        assert_eq!(results.best.len(), 1);
        let best = &results.best[0];
        assert_eq!(best.title, "One way");
        assert_eq!(best.total_price, Some(Money::new(189.0, "USD")));
        assert_eq!(best.out_duration.as_deref(), Some("130"));
        let leg = &best.legs_out[0];
        assert_eq!(leg.departure_airport.as_deref(), Some("OAK"));
        assert_eq!(leg.departure_time.as_deref(), Some("2025-11-21 08:05"));
        assert_eq!(leg.arrival_airport.as_deref(), Some("SEA"));
        assert_eq!(leg.duration.as_deref(), Some("130"));
        assert_eq!(leg.flight_number.as_deref(), Some("AS 1421"));
        assert_eq!(results.other[0].title, "Departing flight");
    }

    #[test]
    fn test_carrier_prefix_added() {
        let raw = json!([{
            "flights": [{
                "from": "OAK",
                "to": {"iata": "SEA"},
                "carrier": {"name": "Alaska Airlines", "iata": "AS"},
                "number": 330,
                "stops": [{"name": "PDX"}, "BOI"]
            }]
        }]);
        let results = buckets(normalize_flights(raw, &query()));
        let leg = &results.best[0].legs_out[0];
        assert_eq!(leg.flight_number.as_deref(), Some("AS330"));
        assert_eq!(leg.airline.as_deref(), Some("Alaska Airlines"));
        assert_eq!(leg.departure_airport.as_deref(), Some("OAK"));
        assert_eq!(leg.arrival_airport.as_deref(), Some("SEA"));
        assert_eq!(leg.layovers, vec!["PDX".to_string(), "BOI".to_string()]);
    }

    #[test]
    fn test_wrapped_results_and_caps() {
        let option = json!({
            "title": "Nonstop",
            "total_price": {"amount": 99, "currency": "EUR"},
            "legs_out": [{"airline": "Alaska", "flight_number": "AS1"}],
            "booking_links": [
                {"provider_name": "Alaska", "link": "https://a", "price": 99},
                {"provider": "Expedia", "link": "https://b"},
                {"provider": "Kayak", "link": "https://c"}
            ]
        });
        let raw = json!({"results": {"best": [option.clone(), option.clone(), option.clone(), option]}});
        let results = buckets(normalize_flights(raw, &query()));
        assert_eq!(results.best.len(), 3);
        let first = &results.best[0];
        assert_eq!(first.currency, "EUR");
        assert_eq!(first.total_price, Some(Money::new(99.0, "EUR")));
        assert_eq!(first.booking_links.len(), 2);
        assert_eq!(first.booking_links[0].provider.as_deref(), Some("Alaska"));
        assert_eq!(first.booking_links[0].price.as_deref(), Some("99"));
        assert_eq!(first.legs_out[0].airline.as_deref(), Some("Alaska"));
    }

    #[test]
    fn test_normalized_keys_take_precedence() {
        let raw = json!({"best": [{"title": "A"}], "best_flights": [{"title": "B"}]});
        let results = buckets(normalize_flights(raw, &query()));
        assert_eq!(results.best[0].title, "A");
    }

    #[test]
    fn test_empty_payloads_need_clarification() {
        for raw in [json!([]), json!({}), json!(null), json!("garbage"), json!({"best": "nope"})] {
            match normalize_flights(raw, &query()) {
                CapabilityOutcome::Clarification(c) => {
                    assert!(c.user_prompt_needed);
                    assert_eq!(c.suggested_questions.len(), 3);
                    assert_eq!(c.query_parsed.as_ref().map(|q| q.origin.as_str()), Some("OAK"));
                }
                other => panic!("expected clarification, got {:?}", other),
            }
        }
    }
}
