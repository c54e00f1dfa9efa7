//! Free-text flight query parsing

use chrono::NaiveDate;
use tracing::debug;

use super::dates::{iso_dates, month_day, month_day_range};
use super::places::{CityMention, city_mentions, infer_home_airport};
use crate::domain::{CabinClass, Clarification, FlightQuery};
use crate::pattern::Pattern;

static CONNECTOR: Pattern = Pattern::new(r"(?i)\b([a-z]{3,})(?:\s+to\s+|\s*(?:->|→|—|–|-)\s*)([a-z]{3,})\b");
static NON_STOP: Pattern = Pattern::new(r"(?i)\bnon[-\s]?stop\b");
static PREMIUM_ECONOMY: Pattern = Pattern::new(r"(?i)\bpremium[-\s]economy\b");
static ECONOMY: Pattern = Pattern::new(r"(?i)\beconomy\b");
static BUSINESS: Pattern = Pattern::new(r"(?i)\bbusiness\b");
static FIRST_CLASS: Pattern = Pattern::new(r"(?i)\bfirst[-\s]class\b");
static SEATS: Pattern = Pattern::new(r"(?i)\b(\d+)\s*(?:seats?|adults?|passengers?|travell?ers?)\b");
static CURRENCY: Pattern = Pattern::new(r"(?i)\b(USD|EUR|GBP|CAD|AUD|JPY|INR|CNY|KRW|MXN)\b");

/// Lowercase three-letter words that are never read as airport codes
const STOPWORDS: &[&str] = &[
    "NON", "THE", "AND", "FOR", "ONE", "TWO", "WAY", "DAY", "FLY", "GET", "OUT", "BUY", "SEE", "ANY", "ALL", "NEW",
    "OUR", "ARE", "CAN", "MAY", "HOW", "WHO", "BUT", "NOT", "VIA",
];

/// Read a word as an airport code
///
/// Words typed in capitals are always codes. Other three-letter words are
/// codes unless they are common English words.
fn airport_code(word: &str) -> Option<String> {
    if word.len() != 3 || !word.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let upper = word.to_ascii_uppercase();
    if word == upper || !STOPWORDS.contains(&upper.as_str()) {
        Some(upper)
    } else {
        None
    }
}

/// Origin and destination resolved from one connector match
#[derive(Debug, Default)]
struct Route {
    origin: Option<String>,
    destination: Option<String>,
}

fn resolve_route(text: &str, mentions: &[CityMention]) -> Route {
    let Some(re) = CONNECTOR.regex() else {
        return Route::default();
    };

    let mut partial: Option<Route> = None;
    let mut pos = 0;
    while pos <= text.len() {
        let Some(caps) = re.captures_at(text, pos) else {
            break;
        };
        let (Some(g1), Some(g2)) = (caps.get(1), caps.get(2)) else {
            break;
        };

        let origin = mentions
            .iter()
            .find(|m| m.end == g1.end())
            .map(|m| m.airport.to_string())
            .or_else(|| airport_code(g1.as_str()))
            .or_else(|| {
                mentions
                    .iter()
                    .rev()
                    .find(|m| m.end <= g1.start())
                    .map(|m| m.airport.to_string())
            });
        let destination = mentions
            .iter()
            .find(|m| m.start == g2.start())
            .map(|m| m.airport.to_string())
            .or_else(|| airport_code(g2.as_str()))
            .or_else(|| {
                mentions
                    .iter()
                    .find(|m| m.start >= g2.end())
                    .map(|m| m.airport.to_string())
            });

        if origin.is_some() && destination.is_some() {
            return Route { origin, destination };
        }
        if partial.is_none() && destination.is_some() {
            partial = Some(Route { origin, destination });
        }
        // the destination word may open the next route
        pos = g2.start();
    }
    partial.unwrap_or_default()
}

fn parse_cabin(text: &str) -> Option<CabinClass> {
    if PREMIUM_ECONOMY.is_match(text) {
        Some(CabinClass::PremiumEconomy)
    } else if ECONOMY.is_match(text) {
        Some(CabinClass::Economy)
    } else if BUSINESS.is_match(text) {
        Some(CabinClass::Business)
    } else if FIRST_CLASS.is_match(text) {
        Some(CabinClass::First)
    } else {
        None
    }
}

fn parse_seats(text: &str) -> u32 {
    SEATS
        .captures(text)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .unwrap_or(1)
        .max(1)
}

fn parse_currency(text: &str) -> String {
    CURRENCY
        .captures(text)
        .map(|caps| caps[1].to_ascii_uppercase())
        .unwrap_or_else(|| "USD".to_string())
}

fn parse_dates(text: &str, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let iso = iso_dates(text);
    if let Some(first) = iso.first() {
        return (Some(*first), iso.get(1).copied());
    }
    if let Some(range) = month_day_range(text, today) {
        return (Some(range.start), Some(range.end));
    }
    (month_day(text, today), None)
}

/// Parse a free-text flight request into a typed query
///
/// A missing origin falls back to the airport of `home_city`. When origin,
/// destination or departure date is still unknown the caller gets a
/// clarification instead, and no search should be made.
pub fn parse_flight_query(text: &str, home_city: &str, today: NaiveDate) -> Result<FlightQuery, Clarification> {
    debug!(%text, %home_city, "parse_flight_query: called");
    let mentions = city_mentions(text);
    let route = resolve_route(text, &mentions);

    let origin = route
        .origin
        .or_else(|| infer_home_airport(home_city).map(str::to_string));
    let destination = route.destination;
    let (depart, ret) = parse_dates(text, today);

    match (origin, destination, depart) {
        (Some(origin), Some(destination), Some(depart)) => {
            let query = FlightQuery {
                origin,
                destination,
                depart_date: depart.format("%Y-%m-%d").to_string(),
                return_date: ret.map(|d| d.format("%Y-%m-%d").to_string()),
                non_stop: NON_STOP.is_match(text),
                cabin: parse_cabin(text),
                seats: parse_seats(text),
                currency: parse_currency(text),
            };
            debug!(?query, "parse_flight_query: parsed");
            Ok(query)
        }
        (origin, destination, depart) => {
            let mut missing = Vec::new();
            if origin.is_none() {
                missing.push("origin");
            }
            if destination.is_none() {
                missing.push("destination");
            }
            if depart.is_none() {
                missing.push("depart_date");
            }

            let mut questions = Vec::new();
            if origin.is_none() && !home_city.trim().is_empty() {
                questions.push(format!("What's your preferred airport near {}?", home_city));
            }
            if origin.is_none() || destination.is_none() {
                questions.push("What cities or airports are you flying between?".to_string());
            }
            if depart.is_none() {
                questions.push("What is your departure date in YYYY-MM-DD?".to_string());
            }
            if ret.is_none() {
                questions.push("Do you need a return date?".to_string());
            }

            debug!(?missing, "parse_flight_query: incomplete query");
            Err(Clarification::new(format!("Missing {}", missing.join("/")), questions))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: &str = "Berkeley, CA, USA";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
    }

    #[test]
    fn test_codes_and_iso_dates() {
        let query = parse_flight_query("SFO to SEA 2025-11-21 return 2025-11-23", HOME, today()).unwrap();
        assert_eq!(query.origin, "SFO");
        assert_eq!(query.destination, "SEA");
        assert_eq!(query.depart_date, "2025-11-21");
        assert_eq!(query.return_date.as_deref(), Some("2025-11-23"));
        assert_eq!(query.seats, 1);
        assert_eq!(query.currency, "USD");
        assert!(!query.non_stop);
        assert_eq!(query.cabin, None);
    }

    #[test]
    fn test_city_names_and_month_range() {
        let query = parse_flight_query("Flights from Los Angeles to New York Nov 21-23", HOME, today()).unwrap();
        assert_eq!(query.origin, "LAX");
        assert_eq!(query.destination, "JFK");
        assert_eq!(query.depart_date, "2025-11-21");
        assert_eq!(query.return_date.as_deref(), Some("2025-11-23"));
    }

    #[test]
    fn test_origin_defaults_to_home_airport() {
        let query = parse_flight_query("flights to Seattle on Dec 5", HOME, today()).unwrap();
        assert_eq!(query.origin, "OAK");
        assert_eq!(query.destination, "SEA");
        assert_eq!(query.depart_date, "2025-12-05");
        assert_eq!(query.return_date, None);
    }

    #[test]
    fn test_dash_connector() {
        let query = parse_flight_query("OAK-SEA 2025-11-21", HOME, today()).unwrap();
        assert_eq!((query.origin.as_str(), query.destination.as_str()), ("OAK", "SEA"));
    }

    #[test]
    fn test_non_stop_is_not_a_route() {
        let query = parse_flight_query("non-stop flight SFO to SEA 2025-11-21", HOME, today()).unwrap();
        assert!(query.non_stop);
        assert_eq!(query.origin, "SFO");
        assert_eq!(query.destination, "SEA");
    }

    #[test]
    fn test_flags_seats_currency() {
        let query = parse_flight_query(
            "SFO to BOS 2025-11-21 premium economy 3 adults in EUR",
            HOME,
            today(),
        )
        .unwrap();
        assert_eq!(query.cabin, Some(CabinClass::PremiumEconomy));
        assert_eq!(query.seats, 3);
        assert_eq!(query.currency, "EUR");

        let query = parse_flight_query("SFO to BOS 2025-11-21 first class 0 seats", HOME, today()).unwrap();
        assert_eq!(query.cabin, Some(CabinClass::First));
        assert_eq!(query.seats, 1);
    }

    #[test]
    fn test_missing_destination_asks_for_airports() {
        let clarification = parse_flight_query("I want to fly on 2025-11-21", HOME, today()).unwrap_err();
        assert!(clarification.user_prompt_needed);
        assert_eq!(clarification.error, "Missing destination");
        assert!(
            clarification
                .suggested_questions
                .iter()
                .any(|q| q.contains("airports"))
        );
    }

    #[test]
    fn test_missing_origin_hint_comes_first() {
        let clarification = parse_flight_query("flights to Seattle", "", today()).unwrap_err();
        assert_eq!(clarification.error, "Missing origin/depart_date");

        let clarification = parse_flight_query("flights to Seattle", "Reykjavik", today()).unwrap_err();
        assert_eq!(
            clarification.suggested_questions[0],
            "What's your preferred airport near Reykjavik?"
        );
    }

    #[test]
    fn test_airport_code_rules() {
        assert_eq!(airport_code("sea").as_deref(), Some("SEA"));
        assert_eq!(airport_code("THE").as_deref(), Some("THE"));
        assert_eq!(airport_code("the"), None);
        assert_eq!(airport_code("Non"), None);
        assert_eq!(airport_code("seattle"), None);
    }
}
