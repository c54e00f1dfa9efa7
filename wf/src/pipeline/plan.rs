//! Plan stage: goal and context to an ordered list of capability calls

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::context::{RequestScope, plan_message, trip_dates};
use super::{PipelineError, StageLimits};
use crate::capabilities::CapabilityExecutor;
use crate::domain::{PlanTask, is_blank};
use crate::extract::{Prefill, extract_json};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::{PlanPromptContext, PromptLoader, ToolSummary};

/// Parameter keys in the order they read best as a query
const PARAMETER_ORDER: &[&str] = &[
    "query",
    "q",
    "location",
    "city",
    "depart_date",
    "departure_date",
    "outbound_date",
    "date",
    "check_in",
    "check_in_date",
    "return_date",
    "check_out",
    "check_out_date",
];
const ORIGIN_KEYS: &[&str] = &["origin", "from", "departure"];
const DESTINATION_KEYS: &[&str] = &["destination", "to", "arrival"];

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn take_first(params: &mut Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| params.remove(*key).as_ref().and_then(scalar_text))
}

/// Flatten a `parameters` object into a free-text query
///
/// An origin and destination pair reads as `A to B`; known keys follow in a
/// fixed order and anything else trails in key order.
pub fn join_parameters(params: &Map<String, Value>) -> String {
    let mut rest = params.clone();
    let mut parts = Vec::new();

    let origin = take_first(&mut rest, ORIGIN_KEYS);
    let destination = take_first(&mut rest, DESTINATION_KEYS);
    match (origin, destination) {
        (Some(o), Some(d)) => parts.push(format!("{} to {}", o, d)),
        (Some(o), None) => parts.push(format!("from {}", o)),
        (None, Some(d)) => parts.push(format!("to {}", d)),
        (None, None) => {}
    }

    for key in PARAMETER_ORDER {
        if let Some(text) = rest.remove(*key).as_ref().and_then(scalar_text) {
            parts.push(text);
        }
    }
    parts.extend(rest.values().filter_map(scalar_text));
    parts.join(" ")
}

fn task_from(value: &Value) -> Option<PlanTask> {
    let obj = value.as_object()?;
    let tool_name = obj
        .get("tool_name")
        .or_else(|| obj.get("tool"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?;

    let query = match obj.get("query").and_then(scalar_text) {
        Some(query) => query,
        None => join_parameters(obj.get("parameters").and_then(Value::as_object)?),
    };
    if is_blank(&query) {
        return None;
    }
    Some(PlanTask::new(tool_name, query))
}

/// Turn the extracted plan value into tasks
///
/// Elements without a tool name or query are skipped. Only a non-array is a
/// planning failure; an empty plan goes straight to synthesis.
pub fn parse_plan(value: &Value) -> Result<Vec<PlanTask>, PipelineError> {
    let Some(elements) = value.as_array() else {
        return Err(PipelineError::PlanningFailed("model did not return a JSON array".to_string()));
    };

    let tasks: Vec<PlanTask> = elements.iter().filter_map(task_from).collect();
    if tasks.len() < elements.len() {
        warn!(
            skipped = elements.len() - tasks.len(),
            "parse_plan: skipped unusable plan elements"
        );
    }
    if tasks.is_empty() {
        warn!("parse_plan: plan has no capability calls");
    }
    Ok(tasks)
}

/// Render the plan system prompt for the available capabilities
pub fn plan_prompt(
    prompts: &PromptLoader,
    executor: &CapabilityExecutor,
    scope: RequestScope<'_>,
) -> Result<String, PipelineError> {
    let RequestScope { request, profile, now } = scope;
    let context = PlanPromptContext {
        tools: executor
            .catalog()
            .into_iter()
            .map(|(name, description)| ToolSummary {
                name: name.to_string(),
                description: description.to_string(),
            })
            .collect(),
        city: profile.city.clone(),
        timezone: profile.timezone.clone(),
        today: now.date_naive().format("%Y-%m-%d").to_string(),
        trip_dates: trip_dates(&request.itinerary),
    };
    prompts.render("plan", &context).map_err(PipelineError::prompt)
}

/// Ask the planning model which capabilities to call
pub async fn run_plan(
    llm: &dyn LlmClient,
    prompts: &PromptLoader,
    executor: &CapabilityExecutor,
    scope: RequestScope<'_>,
    limits: StageLimits,
) -> Result<Vec<PlanTask>, PipelineError> {
    debug!(goal = %scope.request.prompt, "run_plan: called");
    let system = plan_prompt(prompts, executor, scope)?;
    let completion = CompletionRequest::new(system, plan_message(scope))
        .with_prefill(Prefill::Array.as_str())
        .with_limits(limits.max_tokens, limits.temperature);

    let response = llm.complete(completion).await?;
    let value = extract_json(&response.content, Some(Prefill::Array))?;
    let tasks = parse_plan(&value)?;
    info!(task_count = tasks.len(), "run_plan: plan ready");
    Ok(tasks)
}
