//! search_events capability
//!
//! Three tiers, each normalized before it is accepted:
//! 1. Google Events with the query, the target city and, when one parses,
//!    an explicit date range
//! 2. the same search without the date range (skipped when tier 1 had none)
//! 3. a web search restricted to ticketing sites

use async_trait::async_trait;
use tracing::{debug, info};

use super::fetch;
use crate::capabilities::{Capability, CapabilityContext, CapabilityError};
use crate::domain::{CapabilityOutcome, Event};
use crate::normalize::{events_outcome, normalize_events, normalize_web_results, provider_failure};
use crate::query::dates::query_range;
use crate::query::{DateRange, target_event_city};
use crate::search::{Engine, SearchParams};

const TICKET_SITES: &str = "site:eventbrite.com OR site:ticketmaster.com OR site:stubhub.com";

/// Search local events for a free-text request
pub struct EventsCapability;

fn events_params(query: &str, city: &str, range: Option<&DateRange>) -> SearchParams {
    SearchParams::new(Engine::GoogleEvents)
        .with("q", query)
        .with("location", city)
        .with_opt("date", range.map(DateRange::as_param))
}

fn web_params(city: &str, range: Option<&DateRange>) -> SearchParams {
    let when = range.map(|r| format!(" {}", r.describe())).unwrap_or_default();
    SearchParams::new(Engine::Google)
        .with("q", format!("{} events{} {}", city, when, TICKET_SITES))
        .with("num", "10")
}

async fn search_tiers(
    query: &str,
    city: &str,
    range: Option<&DateRange>,
    ctx: &CapabilityContext,
) -> Result<Vec<Event>, CapabilityError> {
    let today = ctx.today();
    let events = normalize_events(&fetch(ctx, &events_params(query, city, range)).await?, today);
    if !events.is_empty() {
        return Ok(events);
    }

    if range.is_some() {
        debug!("search_tiers: retrying without date range");
        let events = normalize_events(&fetch(ctx, &events_params(query, city, None)).await?, today);
        if !events.is_empty() {
            return Ok(events);
        }
    }

    info!(%city, "search_tiers: falling back to ticketing sites");
    let raw = fetch(ctx, &web_params(city, range)).await?;
    Ok(normalize_web_results(&raw))
}

#[async_trait]
impl Capability for EventsCapability {
    fn name(&self) -> &'static str {
        "search_events"
    }

    fn description(&self) -> &'static str {
        "Search local events (concerts, comedy, sports, museums). Query should name the city and dates, e.g. 'jazz in Seattle Nov 21-23'."
    }

    async fn invoke(&self, query: &str, ctx: &CapabilityContext) -> CapabilityOutcome {
        debug!(%query, "EventsCapability::invoke: called");
        let city = target_event_city(query, &ctx.profile.city);
        let range = query_range(query, ctx.today());

        match search_tiers(query, &city, range.as_ref(), ctx).await {
            Ok(events) => events_outcome(events, &city),
            Err(e) => CapabilityOutcome::Clarification(provider_failure(e)),
        }
    }
}
