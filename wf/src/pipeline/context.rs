//! Context block shared by the plan and synthesis stages

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::domain::{ConversationTurn, ItineraryItem, PlanRequest};
use crate::profile::UserProfile;
use crate::scheduler::parse_local;

/// Per-request inputs shared by the model stages
#[derive(Debug, Clone, Copy)]
pub struct RequestScope<'a> {
    pub request: &'a PlanRequest,
    /// Profile snapshot taken when the request started
    pub profile: &'a UserProfile,
    pub now: DateTime<Utc>,
}

/// Prior turns forwarded to the models
pub const HISTORY_TURNS: usize = 6;

/// The request's notion of "now" as sent to the models
pub fn now_utc(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// One-line profile and clock context
pub fn context_line(profile: &UserProfile, now: DateTime<Utc>) -> String {
    format!(
        "CONTEXT: user_city={}; user_lat={}; user_lon={}; user_timezone={}; now_utc={}. Always plan into the future from now; avoid past dates.",
        profile.city,
        profile.latitude,
        profile.longitude,
        profile.timezone,
        now_utc(now)
    )
}

/// Most recent turns, oldest first
pub fn recent_turns(history: &[ConversationTurn]) -> &[ConversationTurn] {
    &history[history.len().saturating_sub(HISTORY_TURNS)..]
}

/// First and last day covered by an itinerary, e.g. `2025-11-21 to 2025-11-23`
pub fn trip_dates(itinerary: &[ItineraryItem]) -> Option<String> {
    let mut days = itinerary
        .iter()
        .flat_map(|item| {
            let start = parse_local(&item.start_time);
            let end = item.end_time.as_deref().and_then(parse_local);
            [start, end]
        })
        .flatten()
        .map(|t| t.date());
    let first = days.next()?;
    let (min, max) = days.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    Some(format!("{} to {}", min.format("%Y-%m-%d"), max.format("%Y-%m-%d")))
}

/// User message for the plan stage
///
/// Context line, prior conversation, the current itinerary with its trip
/// dates, then the goal itself.
pub fn plan_message(scope: RequestScope<'_>) -> String {
    let RequestScope { request, profile, now } = scope;
    debug!(
        history = request.conversation_history.len(),
        items = request.itinerary.len(),
        "plan_message: called"
    );
    let mut out = context_line(profile, now);
    out.push('\n');

    let turns = recent_turns(&request.conversation_history);
    if !turns.is_empty() {
        out.push_str("\nPRIOR CONVERSATION:\n");
        for turn in turns {
            out.push_str(&format!("{}: {}\n", turn.role, turn.content.trim()));
        }
    }

    if !request.itinerary.is_empty() {
        out.push_str("\nCURRENT ITINERARY:\n");
        for item in &request.itinerary {
            out.push_str(&format!("- {} {} ({})\n", item.start_time, item.title, item.item_type.as_str()));
        }
        if let Some(dates) = trip_dates(&request.itinerary) {
            out.push_str(&format!("TRIP DATES: {}\n", dates));
        }
    }

    out.push('\n');
    out.push_str(request.prompt.trim());
    out
}
