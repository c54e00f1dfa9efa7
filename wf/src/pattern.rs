//! Lazily compiled regular expressions for the text heuristics

use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::warn;

/// A regex compiled on first use
///
/// A pattern that fails to compile logs once and then never matches.
pub(crate) struct Pattern {
    source: &'static str,
    cell: OnceLock<Option<Regex>>,
}

impl Pattern {
    pub(crate) const fn new(source: &'static str) -> Self {
        Self {
            source,
            cell: OnceLock::new(),
        }
    }

    pub(crate) fn regex(&self) -> Option<&Regex> {
        self.cell
            .get_or_init(|| match Regex::new(self.source) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(pattern = %self.source, error = %e, "Pattern::regex: failed to compile");
                    None
                }
            })
            .as_ref()
    }

    pub(crate) fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.regex()?.captures(text)
    }

    pub(crate) fn captures_all<'t>(&self, text: &'t str) -> Vec<Captures<'t>> {
        match self.regex() {
            Some(re) => re.captures_iter(text).collect(),
            None => Vec::new(),
        }
    }

    pub(crate) fn is_match(&self, text: &str) -> bool {
        self.regex().is_some_and(|re| re.is_match(text))
    }
}
