//! Goal-to-itinerary pipeline
//!
//! plan -> execute -> synthesize -> resolve conflicts -> enforce integrity.
//! Refine re-enters at conflict resolution, optionally after a model pass.

mod context;
mod error;
mod options;
mod plan;
mod planner;
mod refine;
mod synthesis;

pub use context::{RequestScope, context_line, plan_message, trip_dates};
pub use error::PipelineError;
pub use options::derive_options;
pub use plan::{join_parameters, parse_plan, run_plan};
pub use planner::Planner;
pub use refine::{REFINED_LOG, Refiner, parse_refined};
pub use synthesis::{assemble_draft, run_synthesis};

use tracing::debug;

use crate::config::LlmConfig;
use crate::domain::PlanResponse;
use crate::scheduler::{ConflictScheduler, enforce_integrity};

/// Token and temperature limits for one model stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageLimits {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for StageLimits {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.2,
        }
    }
}

impl From<&LlmConfig> for StageLimits {
    fn from(config: &LlmConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// Conflict resolution followed by integrity enforcement
///
/// Removal logs are appended to the response logs.
pub fn finalize(scheduler: &ConflictScheduler, mut response: PlanResponse) -> PlanResponse {
    debug!(items = response.itinerary.len(), "finalize: called");
    let resolution = scheduler.resolve(std::mem::take(&mut response.itinerary));
    response.logs.extend(resolution.logs());
    response.itinerary = resolution.itinerary;
    enforce_integrity(&mut response.itinerary, &mut response.locations, &mut response.options);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemType, ItineraryItem, Location, TripOption};

    #[test]
    fn test_finalize_orders_passes() {
        let response = PlanResponse {
            itinerary: vec![
                ItineraryItem::new("Lunch", "2025-11-21T11:45:00", ItemType::Activity).with_id("lunch"),
                ItineraryItem::new("Museum", "2025-11-21T10:00:00", ItemType::Activity)
                    .with_id("museum")
                    .with_end("2025-11-21T11:30:00"),
            ],
            locations: vec![
                Location::new("Lunch spot", 1.0, 2.0, "lunch"),
                Location::new("Museum", 1.0, 2.0, "museum"),
            ],
            options: vec![TripOption::default()],
            logs: vec!["draft".to_string()],
            ..Default::default()
        };

        let done = finalize(&ConflictScheduler::default(), response);

        assert_eq!(done.itinerary.len(), 1);
        assert_eq!(done.itinerary[0].id, "museum");
        // the location of the dropped item goes with it
        assert_eq!(done.locations.len(), 1);
        assert_eq!(done.locations[0].linked_itinerary_id, "museum");
        assert!(!done.options[0].option_id.is_empty());
        assert_eq!(done.logs, vec!["draft", "conflict_removed: 'Lunch' at 2025-11-21T11:45:00"]);
    }

    #[test]
    fn test_stage_limits_from_config() {
        let limits = StageLimits::from(&LlmConfig {
            max_tokens: 4096,
            temperature: 0.3,
            ..LlmConfig::default()
        });
        assert_eq!(limits.max_tokens, 4096);
        assert!((limits.temperature - 0.3).abs() < f32::EPSILON);
    }
}
