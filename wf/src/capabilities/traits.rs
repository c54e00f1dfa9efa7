//! Capability trait definition

use async_trait::async_trait;

use super::context::CapabilityContext;
use crate::domain::CapabilityOutcome;

/// A search capability the planner can call by name
///
/// `invoke` never fails: provider errors and unusable input come back as a
/// clarification outcome.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Capability name (matches the planner's `tool_name`)
    fn name(&self) -> &'static str;

    /// Human-readable description for the planning prompt
    fn description(&self) -> &'static str;

    /// Run the capability for a free-text query
    async fn invoke(&self, query: &str, ctx: &CapabilityContext) -> CapabilityOutcome;
}
