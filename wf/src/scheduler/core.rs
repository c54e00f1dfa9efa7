//! Greedy conflict resolution

use chrono::NaiveDateTime;
use tracing::{debug, info};

use super::config::SchedulerConfig;
use super::time::parse_local;
use crate::domain::ItineraryItem;

/// Time span of one item as the scheduler sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

/// Outcome of one resolution pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Kept items in time order; unparsable starts last
    pub itinerary: Vec<ItineraryItem>,

    /// Dropped items in the order they were rejected
    pub removed: Vec<ItineraryItem>,
}

impl Resolution {
    /// One `conflict_removed` line per dropped item
    pub fn logs(&self) -> Vec<String> {
        self.removed
            .iter()
            .map(|item| format!("conflict_removed: '{}' at {}", item.title, item.start_time))
            .collect()
    }
}

/// Drops itinerary items that overlap an earlier kept item
///
/// Items are stably sorted by start time and kept first-wins. Two items
/// conflict when each starts before the other ends plus the buffer. Items
/// without a parsable start never conflict.
#[derive(Debug, Clone, Default)]
pub struct ConflictScheduler {
    config: SchedulerConfig,
}

impl ConflictScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        debug!(?config, "ConflictScheduler::new: called");
        Self { config }
    }

    fn span(&self, item: &ItineraryItem) -> Option<Span> {
        let start = parse_local(&item.start_time)?;
        let end = item
            .end_time
            .as_deref()
            .and_then(parse_local)
            .map(|end| end.max(start))
            .unwrap_or_else(|| start + self.config.default_duration());
        Some(Span { start, end })
    }

    fn conflicts(&self, a: Span, b: Span) -> bool {
        let buffer = self.config.buffer();
        a.start < b.end + buffer && b.start < a.end + buffer
    }

    /// Resolve conflicts in `items`
    pub fn resolve(&self, items: Vec<ItineraryItem>) -> Resolution {
        debug!(item_count = items.len(), "ConflictScheduler::resolve: called");
        let mut timed: Vec<(Option<Span>, ItineraryItem)> =
            items.into_iter().map(|item| (self.span(&item), item)).collect();
        timed.sort_by_key(|(span, _)| (span.is_none(), span.map(|s| s.start)));

        let mut kept_spans: Vec<Span> = Vec::new();
        let mut resolution = Resolution::default();
        for (span, item) in timed {
            match span {
                Some(span) if kept_spans.iter().any(|k| self.conflicts(*k, span)) => {
                    debug!(title = %item.title, start = %item.start_time, "resolve: conflict, dropping");
                    resolution.removed.push(item);
                }
                Some(span) => {
                    kept_spans.push(span);
                    resolution.itinerary.push(item);
                }
                None => resolution.itinerary.push(item),
            }
        }

        if !resolution.removed.is_empty() {
            info!(
                kept = resolution.itinerary.len(),
                removed = resolution.removed.len(),
                "ConflictScheduler::resolve: conflicts removed"
            );
        }
        resolution
    }
}
