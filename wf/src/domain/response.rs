//! Request and response envelopes for the plan and refine flows

use serde::{Deserialize, Serialize};

use super::itinerary::{ItineraryItem, Location, TripOption};
use super::lenient;

/// Outcome status of a plan or refine request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    #[default]
    Success,
    NeedsClarification,
    Error,
}

impl PlanStatus {
    /// Parse a model-supplied status, tolerating case and spacing variants
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "success" | "ok" => Some(PlanStatus::Success),
            "needs_clarification" | "clarification" => Some(PlanStatus::NeedsClarification),
            "error" | "failed" => Some(PlanStatus::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Success => "success",
            PlanStatus::NeedsClarification => "needs_clarification",
            PlanStatus::Error => "error",
        }
    }
}

/// One prior turn of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    #[serde(deserialize_with = "lenient::string")]
    pub role: String,
    #[serde(deserialize_with = "lenient::string")]
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.role.eq_ignore_ascii_case("assistant")
    }
}

/// A free-text goal plus optional conversation and trip state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanRequest {
    pub prompt: String,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
    #[serde(default)]
    pub itinerary: Vec<ItineraryItem>,
    #[serde(default)]
    pub locations: Vec<Location>,
}

impl PlanRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }
}

/// A user-edited itinerary to validate and clean up
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefineRequest {
    #[serde(default)]
    pub itinerary: Vec<ItineraryItem>,
    #[serde(default)]
    pub locations: Vec<Location>,
}

/// Response shared by the plan and refine flows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    pub status: PlanStatus,
    #[serde(default)]
    pub itinerary: Vec<ItineraryItem>,
    #[serde(default)]
    pub options: Vec<TripOption>,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub locations: Vec<Location>,
}

impl PlanResponse {
    /// Terminal failure: empty arrays, logs preserved
    pub fn error(logs: Vec<String>) -> Self {
        Self {
            status: PlanStatus::Error,
            logs,
            ..Default::default()
        }
    }
}

/// One capability invocation chosen by the plan stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTask {
    pub tool_name: String,
    pub query: String,
}

impl PlanTask {
    pub fn new(tool_name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            query: query.into(),
        }
    }
}
