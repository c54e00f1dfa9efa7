//! Identifier generation for itinerary items and options
//!
//! Item ids are plain UUID strings so they stay compatible with ids supplied by
//! clients and by the synthesis model. Option ids carry a kind prefix and a
//! slug of the title, e.g. `hotel-0193a2-budget-inn-chicago`.

/// Generate a fresh, globally unique itinerary item id
pub fn generate_item_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Generate an option id from its kind and title
pub fn generate_option_id(kind: &str, title: &str) -> String {
    let uuid = uuid::Uuid::now_v7().simple().to_string();
    // v7 ids share their leading timestamp bits, so take the random tail
    let suffix = &uuid[uuid.len() - 6..];
    let slug = slugify(title);
    if slug.is_empty() {
        format!("{}-{}", kind, suffix)
    } else {
        format!("{}-{}-{}", kind, suffix, slug)
    }
}

/// Slugify a title for use in ids
fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .take(6)
        .collect::<Vec<_>>()
        .join("-")
}

/// Whether an id is missing for integrity purposes
pub fn is_blank(id: &str) -> bool {
    id.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_item_id_is_unique() {
        let a = generate_item_id();
        let b = generate_item_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_generate_option_id_format() {
        let id = generate_option_id("hotel", "Budget Inn Chicago");
        assert!(id.starts_with("hotel-"));
        assert!(id.ends_with("-budget-inn-chicago"));
    }

    #[test]
    fn test_generate_option_id_empty_title() {
        let id = generate_option_id("event", "!!!");
        assert!(id.starts_with("event-"));
        assert_eq!(id.split('-').count(), 2);
    }

    #[test]
    fn test_slugify_strips_apostrophes() {
        assert_eq!(slugify("O'Hare Airport"), "ohare-airport");
        assert_eq!(slugify("Rock   &  Roll"), "rock-roll");
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank("   "));
        assert!(!is_blank("item_1"));
    }
}
