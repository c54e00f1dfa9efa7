//! Prompt Template System
//!
//! Loads and renders `.pmt` templates for the plan, synthesis and refine
//! model calls.
//!
//! Template loading chain:
//! 1. `.wayfarer/prompts/{name}.pmt` (user override)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{PlanPromptContext, PromptLoader, RefinePromptContext, SynthesisPromptContext, ToolSummary};
