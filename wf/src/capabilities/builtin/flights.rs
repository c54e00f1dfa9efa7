//! search_flights capability

use async_trait::async_trait;
use tracing::{debug, info};

use super::fetch;
use crate::capabilities::{Capability, CapabilityContext};
use crate::domain::{CapabilityOutcome, FlightQuery};
use crate::normalize::{normalize_flights, provider_failure};
use crate::query::parse_flight_query;
use crate::search::{Engine, SearchParams};

/// Search Google Flights for a free-text flight request
pub struct FlightsCapability;

/// Provider parameters for a parsed query
fn flight_params(query: &FlightQuery) -> SearchParams {
    // 1 = round trip, 2 = one way
    let trip_type = if query.return_date.is_some() { "1" } else { "2" };
    let mut params = SearchParams::new(Engine::GoogleFlights)
        .with("departure_id", &query.origin)
        .with("arrival_id", &query.destination)
        .with("outbound_date", &query.depart_date)
        .with_opt("return_date", query.return_date.as_deref())
        .with("type", trip_type)
        .with("currency", &query.currency)
        .with("adults", query.seats.to_string())
        .with_opt("travel_class", query.cabin.map(|c| c.travel_class()));
    if query.non_stop {
        params = params.with("stops", "1");
    }
    params
}

#[async_trait]
impl Capability for FlightsCapability {
    fn name(&self) -> &'static str {
        "search_flights"
    }

    fn description(&self) -> &'static str {
        "Search flights. Query must name origin and destination (city or airport code) and a future departure date; optionally a return date, cabin, seats, non-stop."
    }

    async fn invoke(&self, query: &str, ctx: &CapabilityContext) -> CapabilityOutcome {
        debug!(%query, "FlightsCapability::invoke: called");
        let parsed = match parse_flight_query(query, &ctx.profile.city, ctx.today()) {
            Ok(parsed) => parsed,
            Err(clarification) => {
                info!(error = %clarification.error, "FlightsCapability::invoke: query incomplete");
                return CapabilityOutcome::Clarification(clarification);
            }
        };

        match fetch(ctx, &flight_params(&parsed)).await {
            Ok(raw) => normalize_flights(raw, &parsed),
            Err(e) => CapabilityOutcome::Clarification(provider_failure(e).with_query(parsed)),
        }
    }
}
