//! CapabilityExecutor - dispatches planned tasks to capabilities

use std::collections::HashMap;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::builtin::{EventsCapability, FlightsCapability, HotelsCapability};
use super::{Capability, CapabilityContext, CapabilityError};
use crate::domain::{CapabilityOutcome, PlanTask};

/// One executed task with its outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub tool: String,
    pub query: String,
    pub result: CapabilityOutcome,
}

/// Everything the execution stage produced for one plan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    /// Results in plan order; unknown capabilities have no entry
    pub results: Vec<ExecutionResult>,

    /// Trace lines for the response
    pub logs: Vec<String>,

    /// Follow-up questions from every clarification, de-duplicated in order
    pub questions: Vec<String>,
}

impl ExecutionReport {
    /// Whether any capability asked for more input
    pub fn needs_clarification(&self) -> bool {
        self.results.iter().any(|r| r.result.is_clarification())
    }
}

/// Registry of capabilities by name
pub struct CapabilityExecutor {
    capabilities: HashMap<String, Box<dyn Capability>>,
}

impl CapabilityExecutor {
    /// Create executor with the flight, hotel and event capabilities
    pub fn standard() -> Self {
        let mut executor = Self::empty();
        executor.add(Box::new(FlightsCapability));
        executor.add(Box::new(HotelsCapability));
        executor.add(Box::new(EventsCapability));
        executor
    }

    /// Create an empty executor (for testing)
    pub fn empty() -> Self {
        Self {
            capabilities: HashMap::new(),
        }
    }

    /// Register a capability under its own name
    pub fn add(&mut self, capability: Box<dyn Capability>) {
        self.capabilities.insert(capability.name().to_string(), capability);
    }

    /// Check if a capability exists
    pub fn has(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    /// Capability names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.capabilities.keys().cloned().collect();
        names.sort();
        names
    }

    /// `(name, description)` pairs, sorted by name
    pub fn catalog(&self) -> Vec<(&'static str, &'static str)> {
        let mut catalog: Vec<_> = self
            .capabilities
            .values()
            .map(|c| (c.name(), c.description()))
            .collect();
        catalog.sort();
        catalog
    }

    /// Invoke one capability by name
    pub async fn invoke(
        &self,
        name: &str,
        query: &str,
        ctx: &CapabilityContext,
    ) -> Result<CapabilityOutcome, CapabilityError> {
        debug!(%name, %query, "CapabilityExecutor::invoke: called");
        match self.capabilities.get(name) {
            Some(capability) => Ok(capability.invoke(query, ctx).await),
            None => Err(CapabilityError::UnknownCapability { name: name.to_string() }),
        }
    }

    /// Run every task of a plan concurrently, keeping plan order
    pub async fn execute_plan(&self, tasks: &[PlanTask], ctx: &CapabilityContext) -> ExecutionReport {
        debug!(task_count = tasks.len(), "CapabilityExecutor::execute_plan: called");
        let outcomes = join_all(
            tasks
                .iter()
                .map(|task| self.invoke(&task.tool_name, &task.query, ctx)),
        )
        .await;

        let mut report = ExecutionReport::default();
        for (task, outcome) in tasks.iter().zip(outcomes) {
            match outcome {
                Ok(result) => {
                    match &result {
                        CapabilityOutcome::Clarification(c) => {
                            report
                                .logs
                                .push(format!("NEEDS_INPUT: {}('{}') -> {}", task.tool_name, task.query, c.error));
                            for question in &c.suggested_questions {
                                if !report.questions.contains(question) {
                                    report.questions.push(question.clone());
                                }
                            }
                        }
                        _ => {
                            report.logs.push(format!("OK: {}('{}')", task.tool_name, task.query));
                        }
                    }
                    debug!(tool = %task.tool_name, summary = %result.summary(), "execute_plan: task finished");
                    report.results.push(ExecutionResult {
                        tool: task.tool_name.clone(),
                        query: task.query.clone(),
                        result,
                    });
                }
                Err(e) => {
                    warn!(tool = %task.tool_name, error = %e, "execute_plan: task not run");
                    report.logs.push(format!("Unknown tool requested: {}", task.tool_name));
                }
            }
        }

        info!(
            results = report.results.len(),
            questions = report.questions.len(),
            "execute_plan: complete"
        );
        report
    }
}

impl Default for CapabilityExecutor {
    fn default() -> Self {
        Self::standard()
    }
}
