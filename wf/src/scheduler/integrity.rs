//! Identifier and reference integrity for a finished itinerary

use std::collections::HashSet;

use tracing::{debug, info};

use crate::domain::{ItineraryItem, Location, TripOption, generate_item_id, generate_option_id, is_blank};

/// What an integrity pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    pub item_ids_assigned: usize,
    pub option_ids_assigned: usize,
    pub locations_dropped: usize,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Give every item and option a unique id, then drop orphaned locations
///
/// Blank ids and repeats of an id already seen get a fresh one; the first
/// holder of an id keeps it. Locations survive only when they link to a
/// surviving item. Running it twice changes nothing the second time.
pub fn enforce_integrity(
    itinerary: &mut [ItineraryItem],
    locations: &mut Vec<Location>,
    options: &mut [TripOption],
) -> IntegrityReport {
    debug!(
        items = itinerary.len(),
        locations = locations.len(),
        options = options.len(),
        "enforce_integrity: called"
    );
    let mut report = IntegrityReport::default();

    let mut seen: HashSet<String> = HashSet::new();
    for item in itinerary.iter_mut() {
        if is_blank(&item.id) || seen.contains(&item.id) {
            item.id = generate_item_id();
            report.item_ids_assigned += 1;
        }
        seen.insert(item.id.clone());
    }

    let mut seen_options: HashSet<String> = HashSet::new();
    for option in options.iter_mut() {
        if is_blank(&option.option_id) || seen_options.contains(&option.option_id) {
            option.option_id = generate_option_id(option.kind.as_str(), &option.title);
            report.option_ids_assigned += 1;
        }
        seen_options.insert(option.option_id.clone());
    }

    let before = locations.len();
    locations.retain(|loc| seen.contains(&loc.linked_itinerary_id));
    report.locations_dropped = before - locations.len();

    if !report.is_clean() {
        info!(?report, "enforce_integrity: repaired");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemType, OptionKind};

    fn item(id: &str, title: &str) -> ItineraryItem {
        ItineraryItem::new(title, "2025-11-21T10:00:00", ItemType::Activity).with_id(id)
    }

    #[test]
    fn test_missing_ids_assigned() {
        let mut items = vec![item("", "Museum"), item("  ", "Lunch"), item("keep-me", "Walk")];
        let mut locations = vec![];
        let mut options = vec![];

        let report = enforce_integrity(&mut items, &mut locations, &mut options);

        assert_eq!(report.item_ids_assigned, 2);
        assert!(items.iter().all(|i| !is_blank(&i.id)));
        assert_eq!(items[2].id, "keep-me");
        assert_ne!(items[0].id, items[1].id);
    }

    #[test]
    fn test_duplicate_ids_reassigned_after_first() {
        let mut items = vec![item("dup", "A"), item("dup", "B")];
        let report = enforce_integrity(&mut items, &mut vec![], &mut []);
        assert_eq!(report.item_ids_assigned, 1);
        assert_eq!(items[0].id, "dup");
        assert_ne!(items[1].id, "dup");
    }

    #[test]
    fn test_orphaned_locations_dropped() {
        let mut items = vec![item("item_1", "Museum")];
        let mut locations = vec![
            Location::new("Museum", 47.6, -122.3, "item_1"),
            Location::new("Gone", 47.6, -122.3, "item_9"),
            Location::new("Unlinked", 47.6, -122.3, ""),
        ];
        let report = enforce_integrity(&mut items, &mut locations, &mut []);
        assert_eq!(report.locations_dropped, 2);
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].name, "Museum");
    }

    #[test]
    fn test_option_ids_assigned() {
        let mut options = vec![TripOption {
            kind: OptionKind::Hotel,
            title: "Budget Inn Chicago".to_string(),
            ..Default::default()
        }];
        let report = enforce_integrity(&mut [], &mut vec![], &mut options);
        assert_eq!(report.option_ids_assigned, 1);
        assert!(options[0].option_id.starts_with("hotel-"));
    }

    #[test]
    fn test_idempotent() {
        let mut items = vec![item("", "Museum"), item("x", "Lunch")];
        let mut locations = vec![Location::new("Lunch spot", 1.0, 2.0, "x")];
        let mut options = vec![TripOption::default()];
        enforce_integrity(&mut items, &mut locations, &mut options);

        let snapshot = (items.clone(), locations.clone(), options.clone());
        let report = enforce_integrity(&mut items, &mut locations, &mut options);

        assert!(report.is_clean());
        assert_eq!((items, locations, options), snapshot);
    }
}
