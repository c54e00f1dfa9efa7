//! Capability error types

use thiserror::Error;

use crate::search::SearchError;

/// Errors raised while dispatching or running a capability
///
/// These never escape the execution stage; they are logged and turned into
/// clarification outcomes.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("Unknown capability: {name}")]
    UnknownCapability { name: String },

    #[error(transparent)]
    Search(#[from] SearchError),
}
