//! Core domain types shared by every stage

mod id;
mod itinerary;
pub mod lenient;
mod response;
mod results;

pub use id::{generate_item_id, generate_option_id, is_blank};
pub use itinerary::{ItemType, ItineraryItem, Location, OptionKind, TripOption, decode_each};
pub use response::{ConversationTurn, PlanRequest, PlanResponse, PlanStatus, PlanTask, RefineRequest};
pub use results::{
    BookingLink, CabinClass, CapabilityOutcome, Clarification, Event, FlightBuckets, FlightLeg, FlightOption,
    FlightQuery, Hotel, Money, Venue,
};
