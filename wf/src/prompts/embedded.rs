//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Plan stage prompt
pub const PLAN: &str = include_str!("../../prompts/plan.pmt");

/// Synthesis stage prompt
pub const SYNTHESIZE: &str = include_str!("../../prompts/synthesize.pmt");

/// Refine prompt
pub const REFINE: &str = include_str!("../../prompts/refine.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "plan" => Some(PLAN),
        "synthesize" => Some(SYNTHESIZE),
        "refine" => Some(REFINE),
        _ => None,
    }
}
