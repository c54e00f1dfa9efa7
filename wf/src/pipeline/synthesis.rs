//! Synthesis stage: execution results to a draft itinerary
//!
//! The model drafts items, locations and options. Code then enforces what the
//! prompt only asks for: required keys, clarification status, and an option
//! for every search result the model left out.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::context::{RequestScope, now_utc, recent_turns};
use super::options::derive_options;
use super::{PipelineError, StageLimits};
use crate::capabilities::{ExecutionReport, ExecutionResult};
use crate::domain::{ConversationTurn, ItineraryItem, Location, PlanResponse, PlanStatus, TripOption, decode_each};
use crate::extract::{Prefill, extract_json};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::{PromptLoader, SynthesisPromptContext};

/// Execution log lines forwarded to the model
pub const LOG_TAIL: usize = 10;

#[derive(Serialize)]
struct SynthesisPayload<'a> {
    goal: &'a str,
    tool_results: &'a [ExecutionResult],
    execution_logs: &'a [String],
    conversation: &'a [ConversationTurn],
    current_itinerary: &'a [ItineraryItem],
    current_locations: &'a [Location],
    user_context: Value,
}

/// User message for the synthesis model: one pretty-printed JSON object
pub fn synthesis_message(
    scope: RequestScope<'_>,
    report: &ExecutionReport,
    logs: &[String],
) -> Result<String, PipelineError> {
    let RequestScope { request, profile, now } = scope;
    let payload = SynthesisPayload {
        goal: request.prompt.trim(),
        tool_results: &report.results,
        execution_logs: &logs[logs.len().saturating_sub(LOG_TAIL)..],
        conversation: recent_turns(&request.conversation_history),
        current_itinerary: &request.itinerary,
        current_locations: &request.locations,
        user_context: json!({
            "city": profile.city,
            "timezone": profile.timezone,
            "now_utc": now_utc(now),
        }),
    };
    serde_json::to_string_pretty(&payload).map_err(|e| PipelineError::SynthesisFailed(e.to_string()))
}

fn required_array<'a>(draft: &'a Value, key: &str) -> Result<&'a [Value], PipelineError> {
    draft
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| PipelineError::SynthesisFailed(format!("model output is missing the '{}' array", key)))
}

/// Validate the extracted draft and reconcile it with the execution report
pub fn assemble_draft(draft: &Value, report: &ExecutionReport) -> Result<PlanResponse, PipelineError> {
    debug!("assemble_draft: called");
    if !draft.is_object() {
        return Err(PipelineError::SynthesisFailed("model did not return a JSON object".to_string()));
    }
    let raw_items = required_array(draft, "itinerary")?;
    let raw_locations = required_array(draft, "locations")?;
    let raw_logs = required_array(draft, "logs")?;
    let mut status = match draft.get("status") {
        Some(Value::String(s)) => PlanStatus::parse(s)
            .ok_or_else(|| PipelineError::SynthesisFailed(format!("model output has an unknown status '{}'", s)))?,
        _ => {
            return Err(PipelineError::SynthesisFailed(
                "model output is missing the 'status' string".to_string(),
            ));
        }
    };

    let mut logs: Vec<String> = raw_logs.iter().filter_map(|l| l.as_str().map(str::to_string)).collect();

    let (itinerary, rejected_items) = decode_each::<ItineraryItem>(raw_items, "itinerary item");
    let (locations, rejected_locations) = decode_each::<Location>(raw_locations, "location");
    logs.extend(rejected_items);
    logs.extend(rejected_locations);

    let mut options: Vec<TripOption> = match draft.get("options").and_then(Value::as_array) {
        Some(raw) => {
            let (options, rejected) = decode_each::<TripOption>(raw, "option");
            logs.extend(rejected);
            options
        }
        None => Vec::new(),
    };
    let derived: Vec<TripOption> = derive_options(&report.results)
        .into_iter()
        .filter(|d| !options.iter().any(|o| o.kind == d.kind && o.title == d.title))
        .collect();
    if !derived.is_empty() {
        debug!(count = derived.len(), "assemble_draft: appending options derived from results");
        options.extend(derived);
    }

    if !report.questions.is_empty() {
        if status != PlanStatus::NeedsClarification {
            info!(questions = report.questions.len(), "assemble_draft: forcing needs_clarification");
        }
        status = PlanStatus::NeedsClarification;
        for question in &report.questions {
            if !logs.contains(question) {
                logs.push(question.clone());
            }
        }
    }

    Ok(PlanResponse {
        status,
        itinerary,
        options,
        logs,
        locations,
    })
}

/// Ask the synthesis model for a draft itinerary
pub async fn run_synthesis(
    llm: &dyn LlmClient,
    prompts: &PromptLoader,
    scope: RequestScope<'_>,
    report: &ExecutionReport,
    logs: &[String],
    buffer_minutes: i64,
    limits: StageLimits,
) -> Result<PlanResponse, PipelineError> {
    debug!(results = report.results.len(), "run_synthesis: called");
    let system = prompts
        .render(
            "synthesize",
            &SynthesisPromptContext {
                timezone: scope.profile.timezone.clone(),
                buffer_minutes,
            },
        )
        .map_err(PipelineError::prompt)?;
    let message = synthesis_message(scope, report, logs)?;
    let completion = CompletionRequest::new(system, message)
        .with_prefill(Prefill::Object.as_str())
        .with_limits(limits.max_tokens, limits.temperature);

    let response = llm.complete(completion).await?;
    let value = extract_json(&response.content, Some(Prefill::Object))?;
    let draft = assemble_draft(&value, report)?;
    if draft.itinerary.is_empty() {
        warn!("run_synthesis: model returned an empty itinerary");
    }
    info!(
        status = draft.status.as_str(),
        items = draft.itinerary.len(),
        options = draft.options.len(),
        "run_synthesis: draft ready"
    );
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CapabilityOutcome, Hotel, OptionKind, PlanRequest};
    use crate::profile::UserProfile;
    use crate::testing::MockLlmClient;
    use chrono::{TimeZone, Utc};

    fn scope<'a>(request: &'a PlanRequest, profile: &'a UserProfile) -> RequestScope<'a> {
        RequestScope {
            request,
            profile,
            now: Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap(),
        }
    }

    fn hotels_report() -> ExecutionReport {
        ExecutionReport {
            results: vec![ExecutionResult {
                tool: "search_hotels".to_string(),
                query: "Chicago downtown budget".to_string(),
                result: CapabilityOutcome::Hotels {
                    hotels: vec![Hotel {
                        name: "Budget Inn Chicago".to_string(),
                        description: None,
                        price_per_night: Some(99.0),
                        price_text: None,
                        currency: "USD".to_string(),
                        rating: None,
                        reviews: None,
                        amenities: vec![],
                        link: None,
                        latitude: Some(41.88),
                        longitude: Some(-87.63),
                        address: None,
                        neighborhood: None,
                    }],
                },
            }],
            logs: vec!["OK: search_hotels('Chicago downtown budget')".to_string()],
            questions: vec![],
        }
    }

    #[test]
    fn test_missing_arrays_fail() {
        let report = ExecutionReport::default();
        let no_locations = json!({"status": "success", "itinerary": []});
        assert!(matches!(
            assemble_draft(&no_locations, &report),
            Err(PipelineError::SynthesisFailed(msg)) if msg.contains("locations")
        ));
        let no_items = json!({"status": "success", "locations": []});
        assert!(matches!(assemble_draft(&no_items, &report), Err(PipelineError::SynthesisFailed(_))));
        assert!(assemble_draft(&json!([]), &report).is_err());
    }

    #[test]
    fn test_questions_force_clarification() {
        let report = ExecutionReport {
            questions: vec![
                "Which airports (origin and destination)?".to_string(),
                "What's your nightly budget cap (USD)?".to_string(),
            ],
            ..Default::default()
        };
        let draft = json!({
            "status": "success",
            "itinerary": [],
            "locations": [],
            "logs": ["What's your nightly budget cap (USD)?"]
        });
        let response = assemble_draft(&draft, &report).unwrap();

        assert_eq!(response.status, PlanStatus::NeedsClarification);
        assert_eq!(
            response.logs,
            vec![
                "What's your nightly budget cap (USD)?".to_string(),
                "Which airports (origin and destination)?".to_string(),
            ]
        );
    }

    #[test]
    fn test_options_derived_when_model_gives_none() {
        let draft = json!({"status": "success", "itinerary": [], "locations": [], "logs": [], "options": []});
        let response = assemble_draft(&draft, &hotels_report()).unwrap();
        assert_eq!(response.options.len(), 1);
        assert_eq!(response.options[0].kind, OptionKind::Hotel);
        assert_eq!(response.options[0].title, "Budget Inn Chicago");
    }

    #[test]
    fn test_model_options_come_first() {
        let draft = json!({
            "status": "success",
            "itinerary": [],
            "locations": [],
            "logs": [],
            "options": [{"option_id": "hotel-1", "type": "hotel", "title": "Picked Inn"}]
        });
        let response = assemble_draft(&draft, &hotels_report()).unwrap();
        let titles: Vec<&str> = response.options.iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, vec!["Picked Inn", "Budget Inn Chicago"]);
    }

    #[test]
    fn test_every_result_stays_selectable() {
        let hotel = |name: &str| Hotel {
            name: name.to_string(),
            description: None,
            price_per_night: None,
            price_text: None,
            currency: "USD".to_string(),
            rating: None,
            reviews: None,
            amenities: vec![],
            link: None,
            latitude: None,
            longitude: None,
            address: None,
            neighborhood: None,
        };
        let report = ExecutionReport {
            results: vec![ExecutionResult {
                tool: "search_hotels".to_string(),
                query: "Chicago downtown".to_string(),
                result: CapabilityOutcome::Hotels {
                    hotels: vec![hotel("Palmer House"), hotel("The Drake"), hotel("Hotel Julian")],
                },
            }],
            ..Default::default()
        };
        let draft = json!({
            "status": "success",
            "itinerary": [],
            "locations": [],
            "logs": [],
            "options": [{"option_id": "drake", "type": "hotel", "title": "The Drake", "description": "Lakefront"}]
        });

        let response = assemble_draft(&draft, &report).unwrap();

        let titles: Vec<&str> = response.options.iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, vec!["The Drake", "Palmer House", "Hotel Julian"]);
        assert_eq!(response.options[0].description, "Lakefront");
        assert!(response.options.iter().all(|o| o.kind == OptionKind::Hotel));
    }

    #[test]
    fn test_status_and_logs_required() {
        let report = ExecutionReport::default();
        let no_status = json!({"itinerary": [], "locations": [], "logs": []});
        assert!(matches!(
            assemble_draft(&no_status, &report),
            Err(PipelineError::SynthesisFailed(msg)) if msg.contains("status")
        ));
        let bad_status = json!({"status": "done", "itinerary": [], "locations": [], "logs": []});
        assert!(matches!(
            assemble_draft(&bad_status, &report),
            Err(PipelineError::SynthesisFailed(msg)) if msg.contains("done")
        ));
        let no_logs = json!({"status": "success", "itinerary": [], "locations": []});
        assert!(matches!(
            assemble_draft(&no_logs, &report),
            Err(PipelineError::SynthesisFailed(msg)) if msg.contains("logs")
        ));
        let logs_not_array = json!({"status": "success", "itinerary": [], "locations": [], "logs": "ok"});
        assert!(assemble_draft(&logs_not_array, &report).is_err());
    }

    #[test]
    fn test_undecodable_records_dropped_with_log() {
        let draft = json!({
            "status": "Success",
            "itinerary": [
                {"id": "a", "title": "Museum", "startTime": "2025-11-21T10:00:00"},
                "garbage"
            ],
            "locations": [
                {"name": "Museum", "latitude": 47.6, "longitude": -122.3, "linkedItineraryId": "a"},
                {"name": "No coordinates", "linkedItineraryId": "a"}
            ],
            "logs": []
        });
        let response = assemble_draft(&draft, &ExecutionReport::default()).unwrap();
        assert_eq!(response.status, PlanStatus::Success);
        assert_eq!(response.itinerary.len(), 1);
        assert_eq!(response.locations.len(), 1);
        assert_eq!(response.logs.len(), 2);
        assert!(response.logs[0].starts_with("dropped invalid itinerary item #1"));
        assert!(response.logs[1].starts_with("dropped invalid location #1"));
    }

    #[test]
    fn test_message_carries_results_and_log_tail() {
        let logs: Vec<String> = (0..15).map(|i| format!("log {}", i)).collect();
        let request = PlanRequest::new("Weekend in Chicago");
        let profile = UserProfile::default();
        let message = synthesis_message(scope(&request, &profile), &hotels_report(), &logs).unwrap();
        let payload: Value = serde_json::from_str(&message).unwrap();

        assert_eq!(payload["goal"], "Weekend in Chicago");
        assert_eq!(payload["tool_results"][0]["tool"], "search_hotels");
        assert_eq!(payload["tool_results"][0]["result"]["hotels"][0]["name"], "Budget Inn Chicago");
        assert_eq!(payload["execution_logs"].as_array().unwrap().len(), LOG_TAIL);
        assert_eq!(payload["execution_logs"][0], "log 5");
        assert_eq!(payload["user_context"]["now_utc"], "2025-10-01T12:00:00Z");
    }

    #[tokio::test]
    async fn test_run_synthesis_object_prefill() {
        let llm = MockLlmClient::new([
            r#""status":"success","itinerary":[{"title":"Lunch","startTime":"2025-11-21T12:00:00","type":"activity"}],"locations":[],"logs":[]}"#,
        ]);
        let request = PlanRequest::new("Weekend in Chicago");
        let profile = UserProfile::default();
        let draft = run_synthesis(
            &llm,
            &PromptLoader::embedded_only(),
            scope(&request, &profile),
            &hotels_report(),
            &[],
            30,
            StageLimits::default(),
        )
        .await
        .unwrap();

        assert_eq!(draft.itinerary[0].title, "Lunch");
        assert_eq!(draft.options.len(), 1);
        let sent = llm.requests();
        assert_eq!(sent[0].prefill.as_deref(), Some("{"));
        assert!(sent[0].system_prompt.contains("at least 30 minutes between activities"));
    }
}
