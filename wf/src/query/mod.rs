//! Query interpretation: free text to typed search parameters

pub mod dates;
mod flights;
mod places;

pub use dates::DateRange;
pub use flights::parse_flight_query;
pub use places::{CityMention, city_mentions, infer_home_airport, target_event_city};
