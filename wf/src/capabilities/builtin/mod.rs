//! Built-in search capabilities

mod events;
mod flights;
mod hotels;

pub use events::EventsCapability;
pub use flights::FlightsCapability;
pub use hotels::HotelsCapability;

use serde_json::Value;
use tracing::debug;

use super::{CapabilityContext, CapabilityError};
use crate::normalize::coerce_payload;
use crate::search::{SearchError, SearchParams};

/// Run one search and unwrap text payloads
///
/// A provider-reported error means "no results" and comes back as `null`;
/// transport and HTTP failures are returned.
async fn fetch(ctx: &CapabilityContext, params: &SearchParams) -> Result<Value, CapabilityError> {
    debug!(engine = %params.engine, "fetch: called");
    match ctx.search.search(params).await {
        Ok(raw) => Ok(coerce_payload(raw)),
        Err(SearchError::Provider(message)) => {
            debug!(%message, "fetch: provider reported no results");
            Ok(Value::Null)
        }
        Err(e) => Err(e.into()),
    }
}
