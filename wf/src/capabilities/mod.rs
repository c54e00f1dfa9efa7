//! Capabilities: named search functions the plan stage can call

pub mod builtin;
mod context;
mod error;
mod executor;
mod traits;

pub use context::CapabilityContext;
pub use error::CapabilityError;
pub use executor::{CapabilityExecutor, ExecutionReport, ExecutionResult};
pub use traits::Capability;
