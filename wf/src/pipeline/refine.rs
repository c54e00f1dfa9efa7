//! Refine flow: validate and clean a user-edited itinerary

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::{PipelineError, StageLimits, finalize};
use crate::config::Config;
use crate::domain::{ItineraryItem, Location, PlanResponse, PlanStatus, RefineRequest, decode_each, is_blank};
use crate::extract::{Prefill, extract_json};
use crate::llm::{CompletionRequest, LlmClient, LlmError, create_client};
use crate::prompts::{PromptLoader, RefinePromptContext};
use crate::scheduler::{ConflictScheduler, SchedulerConfig, enforce_integrity};

/// First log line of every successful refine
pub const REFINED_LOG: &str = "Itinerary refined";

/// Refines itineraries, with or without a model
pub struct Refiner {
    llm: Option<Arc<dyn LlmClient>>,
    prompts: PromptLoader,
    scheduler: ConflictScheduler,
    limits: StageLimits,
}

impl Refiner {
    pub fn new(llm: Option<Arc<dyn LlmClient>>) -> Self {
        debug!(with_model = llm.is_some(), "Refiner::new: called");
        Self {
            llm,
            prompts: PromptLoader::embedded_only(),
            scheduler: ConflictScheduler::default(),
            limits: StageLimits::default(),
        }
    }

    /// Refiner that only runs conflict resolution and integrity enforcement
    pub fn deterministic() -> Self {
        Self::new(None)
    }

    /// Build from config
    ///
    /// A configured refiner whose API key is not set falls back to
    /// deterministic refinement.
    pub fn from_config(config: &Config, prompts: PromptLoader) -> Result<Self, LlmError> {
        debug!("Refiner::from_config: called");
        let llm = match &config.refiner {
            Some(llm_config) if llm_config.has_api_key() => Some(create_client(llm_config)?),
            Some(llm_config) => {
                warn!(env = %llm_config.api_key_env, "Refiner::from_config: API key not set, refining without a model");
                None
            }
            None => None,
        };
        let mut refiner = Self::new(llm)
            .with_prompts(prompts)
            .with_scheduler(config.scheduler.clone());
        if let Some(llm_config) = &config.refiner {
            refiner.limits = StageLimits::from(llm_config);
        }
        Ok(refiner)
    }

    pub fn with_prompts(mut self, prompts: PromptLoader) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_scheduler(mut self, config: SchedulerConfig) -> Self {
        self.scheduler = ConflictScheduler::new(config);
        self
    }

    pub fn has_model(&self) -> bool {
        self.llm.is_some()
    }

    /// Refine an itinerary
    ///
    /// Never fails: on error the caller's data comes back, integrity
    /// enforced, with `status = error`.
    pub async fn refine(&self, request: RefineRequest) -> PlanResponse {
        debug!(
            items = request.itinerary.len(),
            locations = request.locations.len(),
            "Refiner::refine: called"
        );
        let draft = match &self.llm {
            Some(llm) => self.refine_with_model(llm.as_ref(), &request).await,
            None => Ok(PlanResponse {
                status: PlanStatus::Success,
                itinerary: request.itinerary.clone(),
                locations: request.locations.clone(),
                logs: vec![format!("{} without a model", REFINED_LOG)],
                options: Vec::new(),
            }),
        };

        match draft {
            Ok(draft) => {
                let response = finalize(&self.scheduler, draft);
                info!(items = response.itinerary.len(), "Refiner::refine: complete");
                response
            }
            Err(e) => {
                warn!(error = %e, "Refiner::refine: failed, returning caller data");
                let RefineRequest {
                    mut itinerary,
                    mut locations,
                } = request;
                enforce_integrity(&mut itinerary, &mut locations, &mut []);
                PlanResponse {
                    status: PlanStatus::Error,
                    itinerary,
                    options: Vec::new(),
                    logs: vec![format!("Error in refinement: {}", e)],
                    locations,
                }
            }
        }
    }

    async fn refine_with_model(&self, llm: &dyn LlmClient, request: &RefineRequest) -> Result<PlanResponse, PipelineError> {
        let system = self
            .prompts
            .render("refine", &RefinePromptContext::default())
            .map_err(PipelineError::prompt)?;
        let message = serde_json::to_string_pretty(&json!({
            "itinerary": request.itinerary,
            "locations": request.locations,
        }))
        .map_err(|e| PipelineError::SynthesisFailed(e.to_string()))?;
        let completion = CompletionRequest::new(system, message)
            .with_prefill(Prefill::Object.as_str())
            .with_limits(self.limits.max_tokens, self.limits.temperature);

        let response = llm.complete(completion).await?;
        let value = extract_json(&response.content, Some(Prefill::Object))?;
        parse_refined(&value)
    }
}

/// Validate a refine model's reply
pub fn parse_refined(value: &Value) -> Result<PlanResponse, PipelineError> {
    let array = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| PipelineError::SynthesisFailed(format!("refined output is missing the '{}' array", key)))
    };
    let (itinerary, rejected_items) = decode_each::<ItineraryItem>(array("itinerary")?, "itinerary item");
    let (locations, rejected_locations) = decode_each::<Location>(array("locations")?, "location");

    let mut logs = vec![REFINED_LOG.to_string()];
    if let Some(lines) = value.get("logs").and_then(Value::as_array) {
        logs.extend(lines.iter().filter_map(Value::as_str).filter(|l| !is_blank(l)).map(str::to_string));
    }
    logs.extend(rejected_items);
    logs.extend(rejected_locations);

    Ok(PlanResponse {
        status: PlanStatus::Success,
        itinerary,
        options: Vec::new(),
        logs,
        locations,
    })
}
