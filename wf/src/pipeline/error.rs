//! Pipeline error types

use thiserror::Error;

use crate::extract::ExtractError;
use crate::llm::LlmError;

/// Terminal failures of the plan, synthesis and refine stages
///
/// Capability failures never show up here; they become clarification
/// outcomes inside the execution stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    MalformedOutput(#[from] ExtractError),

    #[error("Planning failed: {0}")]
    PlanningFailed(String),

    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Prompt rendering failed: {0}")]
    Prompt(String),
}

impl PipelineError {
    pub(crate) fn prompt(err: eyre::Report) -> Self {
        PipelineError::Prompt(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Prefill, extract_json};

    #[test]
    fn test_malformed_output_is_transparent() {
        let err: PipelineError = extract_json("no json", Some(Prefill::Array)).unwrap_err().into();
        assert!(err.to_string().starts_with("Malformed model output"));
    }

    #[test]
    fn test_llm_error_wraps() {
        let err: PipelineError = LlmError::InvalidResponse("empty".to_string()).into();
        assert!(matches!(err, PipelineError::Llm(_)));
        assert!(err.to_string().starts_with("Model call failed"));
    }
}
