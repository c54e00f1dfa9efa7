//! Itinerary timestamp parsing
//!
//! Items carry local wall-clock times. Offsets, when present, are dropped
//! rather than converted, so `10:00+02:00` and `10:00` are the same instant
//! for scheduling.

use chrono::{DateTime, NaiveDateTime};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M%z"];

/// Parse an itinerary timestamp into local wall time
///
/// Accepts `T` or a space between date and time, optional seconds,
/// fractional seconds and RFC 3339 offsets.
pub fn parse_local(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.len() < 16 || !trimmed.is_char_boundary(10) {
        return None;
    }
    let normalized = match trimmed.as_bytes()[10] {
        b' ' | b't' => format!("{}T{}", &trimmed[..10], trimmed[11..].trim_start()),
        _ => trimmed.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).ok())
        .or_else(|| {
            OFFSET_FORMATS
                .iter()
                .find_map(|fmt| DateTime::parse_from_str(&normalized, fmt).ok())
                .map(|dt| dt.naive_local())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 21)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_separators_and_seconds() {
        assert_eq!(parse_local("2025-11-21T10:00:00"), Some(at(10, 0, 0)));
        assert_eq!(parse_local("2025-11-21 10:00:00"), Some(at(10, 0, 0)));
        assert_eq!(parse_local("2025-11-21T10:00"), Some(at(10, 0, 0)));
        assert_eq!(parse_local("2025-11-21 10:00"), Some(at(10, 0, 0)));
    }

    #[test]
    fn test_fractional_seconds() {
        let parsed = parse_local("2025-11-21T10:00:30.250").unwrap();
        assert_eq!(parsed.format("%H:%M:%S%.3f").to_string(), "10:00:30.250");
    }

    #[test]
    fn test_offsets_keep_wall_time() {
        assert_eq!(parse_local("2025-11-21T10:00:00+02:00"), Some(at(10, 0, 0)));
        assert_eq!(parse_local("2025-11-21T10:00:00Z"), Some(at(10, 0, 0)));
        assert_eq!(parse_local("2025-11-21 18:30:00-08:00"), Some(at(18, 30, 0)));
        assert_eq!(parse_local("2025-11-21T18:30-08:00"), Some(at(18, 30, 0)));
    }

    #[test]
    fn test_unparsable() {
        assert_eq!(parse_local(""), None);
        assert_eq!(parse_local("2025-11-21"), None);
        assert_eq!(parse_local("tomorrow morning"), None);
        assert_eq!(parse_local("2025-13-40T10:00:00"), None);
        assert_eq!(parse_local("Friday, 21 November 2025"), None);
    }
}
