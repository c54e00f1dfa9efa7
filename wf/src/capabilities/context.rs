//! CapabilityContext - what a capability needs to serve one request

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::profile::UserProfile;
use crate::search::SearchProvider;

/// Execution context for capabilities, scoped to a single request
#[derive(Clone)]
pub struct CapabilityContext {
    /// Profile snapshot taken when the request started
    pub profile: UserProfile,

    /// The request's notion of "now"
    pub now: DateTime<Utc>,

    /// Search backend
    pub search: Arc<dyn SearchProvider>,
}

impl CapabilityContext {
    pub fn new(profile: UserProfile, now: DateTime<Utc>, search: Arc<dyn SearchProvider>) -> Self {
        debug!(city = %profile.city, %now, "CapabilityContext::new: called");
        Self { profile, now, search }
    }

    /// Today's date, used to resolve year-less dates
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }
}
