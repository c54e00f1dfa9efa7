//! search_hotels capability

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use tracing::debug;

use super::fetch;
use crate::capabilities::{Capability, CapabilityContext};
use crate::domain::CapabilityOutcome;
use crate::normalize::{normalize_hotels, provider_failure};
use crate::query::dates::query_range;
use crate::search::{Engine, SearchParams};

/// Search Google Hotels with the raw query text
pub struct HotelsCapability;

/// Check-in and check-out dates for a query
///
/// A date range in the query is used when present, otherwise tonight. A
/// one-day range still spans a night.
fn stay_dates(query: &str, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    match query_range(query, today) {
        Some(range) if range.end > range.start => (range.start, range.end),
        Some(range) => (range.start, range.start + Duration::days(1)),
        None => (today, today + Duration::days(1)),
    }
}

#[async_trait]
impl Capability for HotelsCapability {
    fn name(&self) -> &'static str {
        "search_hotels"
    }

    fn description(&self) -> &'static str {
        "Search hotels. Query should name the city or neighborhood and may include dates, budget or star rating."
    }

    async fn invoke(&self, query: &str, ctx: &CapabilityContext) -> CapabilityOutcome {
        debug!(%query, "HotelsCapability::invoke: called");
        let (check_in, check_out) = stay_dates(query, ctx.today());
        let params = SearchParams::new(Engine::GoogleHotels)
            .with("q", query)
            .with("check_in_date", check_in.format("%Y-%m-%d").to_string())
            .with("check_out_date", check_out.format("%Y-%m-%d").to_string())
            .with("currency", "USD");

        match fetch(ctx, &params).await {
            Ok(raw) => normalize_hotels(&raw),
            Err(e) => CapabilityOutcome::Clarification(provider_failure(e)),
        }
    }
}
