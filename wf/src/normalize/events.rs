//! Event search normalization

use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::debug;

use super::{first_f64, first_string, objects, parse_price_text, sub_object};
use crate::domain::{CapabilityOutcome, Event, Venue};
use crate::pattern::Pattern;
use crate::query::dates::add_year_if_missing;

/// Events kept per search
pub const EVENT_LIMIT: usize = 12;

static WHEN_END: Pattern = Pattern::new(r"(?i)–\s*([0-9]{1,2}:[0-9]{2}\s*[AP]M)");

fn parse_times(
    ev: &Map<String, Value>,
    today: NaiveDate,
) -> (Option<String>, Option<String>, Option<String>, Option<String>) {
    let date = sub_object(ev, "date");
    let raw_start = first_string(&date, &["start_date"]);
    let raw_end = first_string(&date, &["end_date"]).or_else(|| raw_start.clone());

    let start_date = raw_start.and_then(|d| add_year_if_missing(&d, today));
    let end_date = raw_end.and_then(|d| add_year_if_missing(&d, today));
    let start_time = first_string(&date, &["start_time"]);
    let end_time = first_string(&date, &["end_time"]).or_else(|| {
        let when = first_string(&date, &["when"])?;
        WHEN_END.captures(&when).map(|caps| caps[1].to_string())
    });
    (start_date, end_date, start_time, end_time)
}

fn parse_ticket(ev: &Map<String, Value>) -> (Option<f64>, Option<String>, Option<String>, Option<String>) {
    let tickets = ev.get("ticket_info").map(objects).unwrap_or_default();
    let price_text = tickets.iter().find_map(|t| first_string(t, &["price"]));
    let link = tickets.iter().find_map(|t| first_string(t, &["link"]));
    let money = price_text.as_deref().and_then(|text| parse_price_text(text, "USD"));
    (
        money.as_ref().map(|m| m.amount),
        money.map(|m| m.currency),
        price_text,
        link,
    )
}

fn normalize_event(ev: &Map<String, Value>, today: NaiveDate) -> Option<Event> {
    let title = first_string(ev, &["title"])?;
    let (start_date, end_date, start_time, end_time) = parse_times(ev, today);
    // a dated event is required outside the web fallback
    start_date.as_ref()?;

    let (price, currency, price_text, ticket_link) = parse_ticket(ev);
    let venue = sub_object(ev, "venue");
    let coords = sub_object(&venue, "gps_coordinates");

    Some(Event {
        title,
        description: first_string(ev, &["description"]),
        start_date,
        end_date,
        start_time,
        end_time,
        venue: Venue {
            name: first_string(&venue, &["name"]),
            address: first_string(&venue, &["address"]),
            latitude: first_f64(&coords, &["latitude"]),
            longitude: first_f64(&coords, &["longitude"]),
        },
        price,
        price_text,
        currency: currency.unwrap_or_else(|| "USD".to_string()),
        link: ticket_link.or_else(|| first_string(ev, &["link"])),
        source: first_string(ev, &["source"]).unwrap_or_else(|| "google_events".to_string()),
    })
}

/// Normalize a Google Events payload; undated or untitled events are dropped
pub fn normalize_events(raw: &Value, today: NaiveDate) -> Vec<Event> {
    let items = raw.get("events_results").map(objects).unwrap_or_default();
    debug!(count = items.len(), "normalize_events: called");
    items
        .iter()
        .filter_map(|ev| normalize_event(ev, today))
        .take(EVENT_LIMIT)
        .collect()
}

/// Normalize organic web results from ticketing sites
///
/// Results need a title and a link; dates are left empty.
pub fn normalize_web_results(raw: &Value) -> Vec<Event> {
    let items = raw.get("organic_results").map(objects).unwrap_or_default();
    debug!(count = items.len(), "normalize_web_results: called");
    items
        .iter()
        .filter_map(|r| {
            let title = first_string(r, &["title"])?;
            let link = first_string(r, &["link"])?;
            Some(Event {
                title,
                description: first_string(r, &["snippet"]),
                start_date: None,
                end_date: None,
                start_time: None,
                end_time: None,
                venue: Venue::default(),
                price: None,
                price_text: None,
                currency: "USD".to_string(),
                link: Some(link),
                source: "web".to_string(),
            })
        })
        .take(EVENT_LIMIT)
        .collect()
}

/// Final outcome of an events search in `city`
pub fn events_outcome(events: Vec<Event>, city: &str) -> CapabilityOutcome {
    if events.is_empty() {
        return CapabilityOutcome::clarification(
            format!("No events found near {}", city),
            vec![
                format!("Broaden beyond {} or include nearby neighborhoods?", city),
                "Any specific event types (concerts, comedy, sports, museums)?".to_string(),
                "Extend the date window by ±1 day?".to_string(),
            ],
        );
    }
    CapabilityOutcome::Events { events }
}
