//! Options derived from normalized search results

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::capabilities::ExecutionResult;
use crate::domain::{CapabilityOutcome, Event, FlightOption, Hotel, OptionKind, TripOption};

fn to_data<T: Serialize>(record: &T) -> Value {
    serde_json::to_value(record).unwrap_or(Value::Null)
}

fn flight_option(bucket: &str, flight: &FlightOption) -> TripOption {
    let price = flight
        .total_price
        .as_ref()
        .map(|m| format!("{:.0} {}", m.amount, m.currency))
        .or_else(|| flight.price_text.clone());
    let description = [price, flight.out_duration.clone()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ");

    TripOption {
        kind: OptionKind::Flight,
        category: bucket.to_string(),
        title: flight.title.clone(),
        description,
        data: to_data(flight),
        ..Default::default()
    }
}

fn hotel_option(hotel: &Hotel) -> TripOption {
    let mut parts = Vec::new();
    if let Some(price) = hotel.price_per_night {
        parts.push(format!("{:.0} {}/night", price, hotel.currency));
    } else if let Some(text) = &hotel.price_text {
        parts.push(text.clone());
    }
    if let Some(rating) = hotel.rating {
        parts.push(format!("rated {}", rating));
    }
    if let Some(area) = &hotel.neighborhood {
        parts.push(area.clone());
    }

    TripOption {
        kind: OptionKind::Hotel,
        category: "hotel".to_string(),
        title: hotel.name.clone(),
        description: parts.join(", "),
        data: to_data(hotel),
        ..Default::default()
    }
}

fn event_option(event: &Event) -> TripOption {
    let when = match (&event.start_date, &event.start_time) {
        (Some(date), Some(time)) => Some(format!("{} {}", date, time)),
        (Some(date), None) => Some(date.clone()),
        _ => None,
    };
    let description = [when, event.venue.name.clone()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" at ");

    TripOption {
        kind: OptionKind::Event,
        category: if event.source == "web" { "web" } else { "event" }.to_string(),
        title: event.title.clone(),
        description,
        data: to_data(event),
        ..Default::default()
    }
}

/// One option per normalized record, in result order
///
/// Option ids are left blank for the integrity pass.
pub fn derive_options(results: &[ExecutionResult]) -> Vec<TripOption> {
    debug!(result_count = results.len(), "derive_options: called");
    results
        .iter()
        .flat_map(|r| match &r.result {
            CapabilityOutcome::Flights { results, .. } => results
                .labeled()
                .map(|(bucket, flight)| flight_option(bucket, flight))
                .collect::<Vec<_>>(),
            CapabilityOutcome::Hotels { hotels } => hotels.iter().map(hotel_option).collect(),
            CapabilityOutcome::Events { events } => events.iter().map(event_option).collect(),
            CapabilityOutcome::Clarification(_) => Vec::new(),
        })
        .collect()
}
