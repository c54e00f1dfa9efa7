//! Static place tables: city names to airports and to canonical event cities

/// City keys and their primary airport, most specific first
const CITY_AIRPORTS: &[(&str, &str)] = &[
    ("berkeley", "OAK"),
    ("oakland", "OAK"),
    ("san francisco", "SFO"),
    ("san jose", "SJC"),
    ("seattle", "SEA"),
    ("los angeles", "LAX"),
    ("new york", "JFK"),
    ("nyc", "JFK"),
    ("manhattan", "JFK"),
    ("brooklyn", "JFK"),
    ("boston", "BOS"),
    ("chicago", "ORD"),
    ("dallas", "DFW"),
    ("atlanta", "ATL"),
    ("miami", "MIA"),
    ("denver", "DEN"),
    ("phoenix", "PHX"),
    ("houston", "IAH"),
    ("austin", "AUS"),
    ("las vegas", "LAS"),
    ("san diego", "SAN"),
    ("portland", "PDX"),
];

/// City keys and the `City, ST` form the events engine expects
const CANONICAL_CITIES: &[(&str, &str)] = &[
    ("los angeles", "Los Angeles, CA"),
    ("san francisco", "San Francisco, CA"),
    ("new york", "New York, NY"),
    ("seattle", "Seattle, WA"),
    ("boston", "Boston, MA"),
    ("chicago", "Chicago, IL"),
    ("austin", "Austin, TX"),
    ("denver", "Denver, CO"),
    ("miami", "Miami, FL"),
    ("las vegas", "Las Vegas, NV"),
    ("san diego", "San Diego, CA"),
    ("portland", "Portland, OR"),
    ("phoenix", "Phoenix, AZ"),
    ("dallas", "Dallas, TX"),
    ("houston", "Houston, TX"),
    ("atlanta", "Atlanta, GA"),
    ("washington", "Washington, DC"),
    ("san jose", "San Jose, CA"),
];

/// Whole-word containment on lowercase text
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack
        .match_indices(needle)
        .any(|(idx, _)| word_bounded(haystack, idx, needle.len()))
}

fn word_bounded(haystack: &str, idx: usize, len: usize) -> bool {
    let before = haystack[..idx].chars().next_back();
    let after = haystack[idx + len..].chars().next();
    !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphanumeric())
}

fn is_washington_dc(lower: &str) -> bool {
    contains_word(lower, "washington") && (contains_word(lower, "dc") || lower.contains("d.c."))
}

/// Best-effort default airport for a home-city string
pub fn infer_home_airport(city: &str) -> Option<&'static str> {
    let lower = city.to_lowercase();
    if lower.trim().is_empty() {
        return None;
    }
    if is_washington_dc(&lower) {
        return Some("DCA");
    }
    CITY_AIRPORTS
        .iter()
        .find(|(key, _)| contains_word(&lower, key))
        .map(|(_, code)| *code)
}

/// A city name found in a text, with its byte span in that text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CityMention {
    pub start: usize,
    pub end: usize,
    pub airport: &'static str,
}

/// Every whole-word city mention in `text`, ordered by position
///
/// Overlapping keys keep the longest match at a given start.
pub fn city_mentions(text: &str) -> Vec<CityMention> {
    // ASCII folding keeps byte offsets aligned with `text`
    let lower = text.to_ascii_lowercase();
    let mut mentions: Vec<CityMention> = Vec::new();

    for (key, code) in CITY_AIRPORTS {
        for (idx, _) in lower.match_indices(key) {
            if word_bounded(&lower, idx, key.len()) {
                mentions.push(CityMention {
                    start: idx,
                    end: idx + key.len(),
                    airport: *code,
                });
            }
        }
    }
    if is_washington_dc(&lower) {
        for (idx, _) in lower.match_indices("washington") {
            mentions.push(CityMention {
                start: idx,
                end: idx + "washington".len(),
                airport: "DCA",
            });
        }
    }

    mentions.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    mentions.dedup_by_key(|m| m.start);
    mentions
}

/// Target city for an events search
///
/// A canonical city named in the query wins; otherwise the first two
/// comma-separated parts of the profile city are used.
pub fn target_event_city(query: &str, profile_city: &str) -> String {
    let lower = query.to_lowercase();
    if let Some((_, canon)) = CANONICAL_CITIES.iter().find(|(key, _)| contains_word(&lower, key)) {
        return canon.to_string();
    }

    let base = if profile_city.trim().is_empty() {
        "United States"
    } else {
        profile_city
    };
    let parts: Vec<&str> = base.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
    match parts.as_slice() {
        [] => "United States".to_string(),
        [city] => city.to_string(),
        [city, region, ..] => format!("{}, {}", city, region),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_home_airport() {
        assert_eq!(infer_home_airport("Berkeley, CA, USA"), Some("OAK"));
        assert_eq!(infer_home_airport("San Francisco"), Some("SFO"));
        assert_eq!(infer_home_airport("Brooklyn, NY"), Some("JFK"));
        assert_eq!(infer_home_airport("Washington, DC"), Some("DCA"));
        assert_eq!(infer_home_airport("Portland, OR"), Some("PDX"));
        assert_eq!(infer_home_airport("Reykjavik"), None);
        assert_eq!(infer_home_airport(""), None);
    }

    #[test]
    fn test_washington_state_is_not_dca() {
        assert_eq!(infer_home_airport("Spokane, Washington"), None);
    }

    fn airports(text: &str) -> Vec<&'static str> {
        city_mentions(text).iter().map(|m| m.airport).collect()
    }

    #[test]
    fn test_mentions_in_order() {
        assert_eq!(airports("from san francisco to seattle"), vec!["SFO", "SEA"]);
        assert!(airports("nowhere in particular").is_empty());
    }

    #[test]
    fn test_city_match_is_word_bounded() {
        assert!(airports("the nycteris bat").is_empty());
        assert_eq!(airports("Fly NYC"), vec!["JFK"]);
        assert_eq!(airports("Washington DC to Miami"), vec!["DCA", "MIA"]);
    }

    #[test]
    fn test_city_mentions_positions() {
        let mentions = city_mentions("Los Angeles to New York");
        assert_eq!(mentions.len(), 2);
        assert_eq!((mentions[0].start, mentions[0].end, mentions[0].airport), (0, 11, "LAX"));
        assert_eq!(mentions[1].airport, "JFK");
        assert_eq!(mentions[1].start, 15);
    }

    #[test]
    fn test_target_event_city_from_query() {
        assert_eq!(target_event_city("Seattle indoor events Nov 21-23", "Berkeley, CA, USA"), "Seattle, WA");
        assert_eq!(target_event_city("comedy in Washington", "Berkeley, CA, USA"), "Washington, DC");
    }

    #[test]
    fn test_target_event_city_from_profile() {
        assert_eq!(target_event_city("live jazz this weekend", "Berkeley, CA, USA"), "Berkeley, CA");
        assert_eq!(target_event_city("live jazz", "Reykjavik"), "Reykjavik");
        assert_eq!(target_event_city("live jazz", ""), "United States");
    }
}
