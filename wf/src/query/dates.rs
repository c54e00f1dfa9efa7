//! Date heuristics shared by the flight, hotel and event capabilities
//!
//! Month-day phrases ("Nov 21", "November 21-23") carry no year. They resolve
//! to the nearest future occurrence: a date more than 30 days before today is
//! rolled forward one year.

use chrono::{Datelike, Duration, NaiveDate};

use crate::pattern::Pattern;

static ISO_DATE: Pattern = Pattern::new(r"\b(\d{4}-\d{2}-\d{2})\b");
static ISO_RANGE: Pattern = Pattern::new(r"(\d{4}-\d{2}-\d{2})\s*(?:\.\.|-|–|to)\s*(\d{4}-\d{2}-\d{2})");
static MONTH_DAY_RANGE: Pattern = Pattern::new(r"\b([A-Za-z]{3,9})\.?\s+(\d{1,2})\s*[-–]\s*(\d{1,2})\b");
static MONTH_DAY: Pattern = Pattern::new(r"\b([A-Za-z]{3,9})\.?\s+(\d{1,2})\b");

const ROLLOVER_DAYS: i64 = 30;

/// An inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// `YYYY-MM-DD to YYYY-MM-DD`
    pub fn as_param(&self) -> String {
        format!("{} to {}", self.start.format("%Y-%m-%d"), self.end.format("%Y-%m-%d"))
    }

    /// `Nov 21, 2025 to Nov 23, 2025`
    pub fn describe(&self) -> String {
        format!("{} to {}", self.start.format("%b %d, %Y"), self.end.format("%b %d, %Y"))
    }
}

/// Month number for an English month name or abbreviation
pub fn month_from_name(name: &str) -> Option<u32> {
    let month = match name.trim_end_matches('.').to_lowercase().as_str() {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(month)
}

/// Resolve a month and day to the nearest future occurrence
pub fn resolve_month_day(month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    let date = NaiveDate::from_ymd_opt(today.year(), month, day)?;
    if date < today - Duration::days(ROLLOVER_DAYS) {
        NaiveDate::from_ymd_opt(today.year() + 1, month, day)
    } else {
        Some(date)
    }
}

/// Valid ISO dates in order of appearance
pub fn iso_dates(text: &str) -> Vec<NaiveDate> {
    ISO_DATE
        .captures_all(text)
        .iter()
        .filter_map(|caps| NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok())
        .collect()
}

/// An explicit ISO range such as `2025-11-21 to 2025-11-23`
pub fn iso_range(text: &str) -> Option<DateRange> {
    let caps = ISO_RANGE.captures(text)?;
    let start = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()?;
    let end = NaiveDate::parse_from_str(&caps[2], "%Y-%m-%d").ok()?;
    (end >= start).then_some(DateRange { start, end })
}

/// A month-day range such as `Nov 21-23`
///
/// An end day smaller than the start day rolls into the following month.
pub fn month_day_range(text: &str, today: NaiveDate) -> Option<DateRange> {
    MONTH_DAY_RANGE.captures_all(text).iter().find_map(|caps| {
        let month = month_from_name(&caps[1])?;
        let d1: u32 = caps[2].parse().ok()?;
        let d2: u32 = caps[3].parse().ok()?;
        let start = resolve_month_day(month, d1, today)?;
        let end = if d2 >= d1 {
            NaiveDate::from_ymd_opt(start.year(), start.month(), d2)?
        } else {
            let (year, month) = if start.month() == 12 {
                (start.year() + 1, 1)
            } else {
                (start.year(), start.month() + 1)
            };
            NaiveDate::from_ymd_opt(year, month, d2)?
        };
        Some(DateRange { start, end })
    })
}

/// A single month-day such as `Dec 5`
pub fn month_day(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    MONTH_DAY.captures_all(text).iter().find_map(|caps| {
        let month = month_from_name(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        resolve_month_day(month, day, today)
    })
}

/// Date range for an events or hotels query: ISO range first, then month-day range
pub fn query_range(text: &str, today: NaiveDate) -> Option<DateRange> {
    iso_range(text).or_else(|| month_day_range(text, today))
}

/// Normalize a provider date to `YYYY-MM-DD`, adding a year when missing
pub fn add_year_if_missing(raw: &str, today: NaiveDate) -> Option<String> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    month_day(raw, today).map(|d| d.format("%Y-%m-%d").to_string())
}
