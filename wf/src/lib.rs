//! Wayfarer - goal-to-itinerary travel planner
//!
//! Wayfarer turns a free-text travel goal into a conflict-free itinerary. A
//! planning model picks search capabilities, the capabilities query flights,
//! hotels and events, and a synthesis model drafts the itinerary. Code then
//! owns correctness: model output is extracted and validated, search results
//! are normalized, overlapping items are dropped and ids are enforced.
//!
//! # Modules
//!
//! - [`extract`] - JSON recovery from raw model output
//! - [`query`] - free-text query interpretation
//! - [`normalize`] - search result normalization
//! - [`capabilities`] - search capabilities and their executor
//! - [`pipeline`] - plan, synthesis and refine stages
//! - [`scheduler`] - conflict resolution and integrity enforcement
//! - [`llm`] - model clients
//! - [`search`] - search provider clients
//! - [`config`] - configuration types and loading
//! - [`cli`] / [`repl`] - command-line front end

pub mod capabilities;
pub mod cli;
pub mod config;
pub mod domain;
pub mod extract;
pub mod llm;
pub mod normalize;
pub(crate) mod pattern;
pub mod pipeline;
pub mod profile;
pub mod prompts;
pub mod query;
pub mod render;
pub mod repl;
pub mod scheduler;
pub mod search;
pub mod testing;

pub use capabilities::{Capability, CapabilityContext, CapabilityError, CapabilityExecutor};
pub use config::{Config, LlmConfig, SearchConfig};
pub use domain::{
    CapabilityOutcome, Clarification, ConversationTurn, ItineraryItem, Location, PlanRequest, PlanResponse,
    PlanStatus, PlanTask, RefineRequest, TripOption,
};
pub use extract::{ExtractError, Prefill, extract_json};
pub use llm::{AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient, create_client};
pub use pipeline::{PipelineError, Planner, Refiner};
pub use profile::{ProfileStore, UserProfile};
pub use prompts::PromptLoader;
pub use scheduler::{ConflictScheduler, SchedulerConfig, enforce_integrity};
pub use search::{SearchError, SearchProvider, SerpApiClient};
