//! Planner - runs the full plan flow for one request at a time

use std::sync::Arc;

use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use super::context::RequestScope;
use super::plan::run_plan;
use super::synthesis::run_synthesis;
use super::{PipelineError, StageLimits, finalize};
use crate::capabilities::{CapabilityContext, CapabilityExecutor};
use crate::config::Config;
use crate::domain::{PlanRequest, PlanResponse, is_blank};
use crate::llm::{LlmClient, create_client};
use crate::profile::ProfileStore;
use crate::prompts::PromptLoader;
use crate::scheduler::{ConflictScheduler, SchedulerConfig};
use crate::search::{SearchProvider, SerpApiClient};

/// Turns a goal into a conflict-free itinerary
///
/// Requests are independent; the only shared state is the profile store,
/// which is read once per request.
pub struct Planner {
    planner: Arc<dyn LlmClient>,
    synthesizer: Arc<dyn LlmClient>,
    search: Arc<dyn SearchProvider>,
    executor: CapabilityExecutor,
    prompts: PromptLoader,
    profiles: ProfileStore,
    scheduler_config: SchedulerConfig,
    scheduler: ConflictScheduler,
    plan_limits: StageLimits,
    synthesis_limits: StageLimits,
}

impl Planner {
    pub fn new(
        planner: Arc<dyn LlmClient>,
        synthesizer: Arc<dyn LlmClient>,
        search: Arc<dyn SearchProvider>,
        profiles: ProfileStore,
    ) -> Self {
        debug!("Planner::new: called");
        Self {
            planner,
            synthesizer,
            search,
            executor: CapabilityExecutor::standard(),
            prompts: PromptLoader::embedded_only(),
            profiles,
            scheduler_config: SchedulerConfig::default(),
            scheduler: ConflictScheduler::default(),
            plan_limits: StageLimits::default(),
            synthesis_limits: StageLimits {
                max_tokens: 4096,
                ..StageLimits::default()
            },
        }
    }

    /// Build a planner from config with HTTP model and search clients
    pub fn from_config(config: &Config, profiles: ProfileStore, prompts: PromptLoader) -> Result<Self> {
        debug!("Planner::from_config: called");
        config.validate()?;
        let planner = create_client(&config.planner).context("Failed to create planner model client")?;
        let synthesizer = create_client(&config.synthesizer).context("Failed to create synthesizer model client")?;
        let search: Arc<dyn SearchProvider> =
            Arc::new(SerpApiClient::from_config(&config.search).context("Failed to create search client")?);

        let mut built = Self::new(planner, synthesizer, search, profiles)
            .with_prompts(prompts)
            .with_scheduler(config.scheduler.clone());
        built.plan_limits = StageLimits::from(&config.planner);
        built.synthesis_limits = StageLimits::from(&config.synthesizer);
        Ok(built)
    }

    pub fn with_prompts(mut self, prompts: PromptLoader) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_scheduler(mut self, config: SchedulerConfig) -> Self {
        self.scheduler = ConflictScheduler::new(config.clone());
        self.scheduler_config = config;
        self
    }

    pub fn with_executor(mut self, executor: CapabilityExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// The shared profile store
    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    /// Plan against the current time
    pub async fn plan(&self, request: PlanRequest) -> PlanResponse {
        self.plan_at(request, Utc::now()).await
    }

    /// Plan with an explicit "now"
    ///
    /// Planning and synthesis failures end the request with `status = error`,
    /// empty arrays and a log naming the phase.
    pub async fn plan_at(&self, request: PlanRequest, now: DateTime<Utc>) -> PlanResponse {
        debug!(goal = %request.prompt, %now, "Planner::plan_at: called");
        let profile = self.profiles.get().await;
        let scope = RequestScope {
            request: &request,
            profile: &profile,
            now,
        };
        let mut logs = vec!["Planning trip...".to_string()];

        let planned = if is_blank(&request.prompt) {
            Err(PipelineError::PlanningFailed("goal is empty".to_string()))
        } else {
            run_plan(
                self.planner.as_ref(),
                &self.prompts,
                &self.executor,
                scope,
                self.plan_limits,
            )
            .await
        };
        let tasks = match planned {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(error = %e, "Planner::plan_at: planning failed");
                logs.push(format!("Error in planning phase: {}", e));
                return PlanResponse::error(logs);
            }
        };
        let steps: Vec<String> = tasks
            .iter()
            .map(|t| format!("{}('{}')", t.tool_name, t.query))
            .collect();
        logs.push(format!("Plan steps: {}", steps.join(", ")));

        logs.push("Executing plan...".to_string());
        let ctx = CapabilityContext::new(profile.clone(), now, self.search.clone());
        let report = self.executor.execute_plan(&tasks, &ctx).await;
        logs.extend(report.logs.iter().cloned());

        let draft = match run_synthesis(
            self.synthesizer.as_ref(),
            &self.prompts,
            scope,
            &report,
            &logs,
            self.scheduler_config.buffer_minutes,
            self.synthesis_limits,
        )
        .await
        {
            Ok(draft) => draft,
            Err(e) => {
                warn!(error = %e, "Planner::plan_at: synthesis failed");
                logs.push(format!("Error in synthesis phase: {}", e));
                return PlanResponse::error(logs);
            }
        };

        logs.extend(draft.logs);
        let response = finalize(&self.scheduler, PlanResponse { logs, ..draft });
        info!(
            status = response.status.as_str(),
            items = response.itinerary.len(),
            options = response.options.len(),
            locations = response.locations.len(),
            "Planner::plan_at: complete"
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlanStatus;
    use crate::profile::UserProfile;
    use crate::search::Engine;
    use crate::testing::{MockLlmClient, MockSearchProvider};
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap()
    }

    fn planner(plan: &str, synthesis: &str, search: MockSearchProvider) -> (Planner, Arc<MockLlmClient>) {
        let synthesizer = Arc::new(MockLlmClient::new([synthesis]));
        let planner = Planner::new(
            Arc::new(MockLlmClient::new([plan])),
            synthesizer.clone(),
            Arc::new(search),
            ProfileStore::default(),
        );
        (planner, synthesizer)
    }

    #[tokio::test]
    async fn test_planning_failure_is_terminal() {
        let (planner, synthesizer) = planner("no plan today", "{}", MockSearchProvider::new());
        let response = planner.plan_at(PlanRequest::new("Weekend in Seattle"), now()).await;

        assert_eq!(response.status, PlanStatus::Error);
        assert!(response.itinerary.is_empty() && response.locations.is_empty() && response.options.is_empty());
        assert!(response.logs.last().unwrap().starts_with("Error in planning phase: "));
        assert_eq!(synthesizer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_goal_fails_planning() {
        let (planner, _) = planner("[]", "{}", MockSearchProvider::new());
        let response = planner.plan_at(PlanRequest::new("   "), now()).await;
        assert_eq!(response.status, PlanStatus::Error);
        assert_eq!(
            response.logs.last().map(String::as_str),
            Some("Error in planning phase: Planning failed: goal is empty")
        );
    }

    #[tokio::test]
    async fn test_empty_plan_still_synthesizes() {
        let (planner, synthesizer) = planner(
            "]",
            r#""status":"success","itinerary":[{"title":"Walk the Riverwalk","startTime":"2025-11-22T10:00:00"}],"locations":[],"logs":[]}"#,
            MockSearchProvider::new(),
        );
        let response = planner.plan_at(PlanRequest::new("Stroll around Chicago"), now()).await;

        assert_eq!(response.status, PlanStatus::Success);
        assert_eq!(synthesizer.call_count(), 1);
        assert_eq!(response.itinerary.len(), 1);
        assert!(response.logs.contains(&"Plan steps: ".to_string()));
        assert!(!response.logs.iter().any(|l| l.starts_with("Error in")));
    }

    #[tokio::test]
    async fn test_synthesis_failure_is_terminal() {
        let (planner, _) = planner(
            r#"{"tool_name":"search_hotels","query":"Chicago downtown budget"}]"#,
            r#""status":"success","itinerary":[]}"#,
            MockSearchProvider::new(),
        );
        let response = planner.plan_at(PlanRequest::new("Weekend in Chicago"), now()).await;

        assert_eq!(response.status, PlanStatus::Error);
        assert!(response.itinerary.is_empty());
        assert!(response.logs.iter().any(|l| l.starts_with("NEEDS_INPUT: search_hotels")));
        assert!(response.logs.last().unwrap().starts_with("Error in synthesis phase: "));
    }

    #[tokio::test]
    async fn test_profile_snapshot_reaches_context() {
        let search = MockSearchProvider::new().with_response(Engine::GoogleEvents, json!({"events_results": []}));
        let planner_llm = Arc::new(MockLlmClient::new([r#"{"tool_name":"search_events","query":"live music"}]"#]));
        let planner = Planner::new(
            planner_llm.clone(),
            Arc::new(MockLlmClient::new([r#""status":"success","itinerary":[],"locations":[],"logs":[]}"#])),
            Arc::new(search),
            ProfileStore::new(UserProfile {
                city: "Austin, TX".to_string(),
                ..Default::default()
            }),
        );

        let response = planner.plan_at(PlanRequest::new("live music this weekend"), now()).await;

        assert!(planner_llm.requests()[0].messages[0].content.contains("user_city=Austin, TX"));
        assert_eq!(response.status, PlanStatus::NeedsClarification);
        assert!(response.logs.iter().any(|l| l.contains("No events found near Austin, TX")));
    }

    #[tokio::test]
    async fn test_custom_executor() {
        let (planner, _) = planner(
            r#"{"tool_name":"search_hotels","query":"Chicago"}]"#,
            r#""status":"success","itinerary":[],"locations":[],"logs":[]}"#,
            MockSearchProvider::new(),
        );
        let planner = planner.with_executor(CapabilityExecutor::empty());
        let response = planner.plan_at(PlanRequest::new("Weekend in Chicago"), now()).await;

        assert_eq!(response.status, PlanStatus::Success);
        assert!(response.logs.contains(&"Unknown tool requested: search_hotels".to_string()));
    }
}
