//! Prompt Loader
//!
//! Loads prompt templates from the override directory or falls back to the
//! embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;

/// A capability as the plan prompt lists it
#[derive(Debug, Clone, Serialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

/// Variables for `plan.pmt`
#[derive(Debug, Clone, Serialize)]
pub struct PlanPromptContext {
    pub tools: Vec<ToolSummary>,
    pub city: String,
    pub timezone: String,
    /// `YYYY-MM-DD`
    pub today: String,
    /// Established trip dates, e.g. `2025-11-21 to 2025-11-23`
    pub trip_dates: Option<String>,
}

/// Variables for `synthesize.pmt`
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisPromptContext {
    pub timezone: String,
    pub buffer_minutes: i64,
}

/// Variables for `refine.pmt`
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefinePromptContext {}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.wayfarer/prompts/`)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader rooted at `root`, using `root/.wayfarer/prompts/` for overrides
    pub fn new(root: impl AsRef<Path>) -> Self {
        let user_dir = root.as_ref().join(".wayfarer/prompts");
        let user_dir_exists = user_dir.exists();
        debug!(?user_dir, %user_dir_exists, "PromptLoader::new: called");

        Self {
            hbs: Self::engine(),
            user_dir: user_dir_exists.then_some(user_dir),
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            user_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // prompts carry JSON, which HTML escaping would mangle
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks the user override first, then the embedded defaults.
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found in user override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        info!("Rendering template '{}'", template_name);
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::embedded_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_context(trip_dates: Option<&str>) -> PlanPromptContext {
        PlanPromptContext {
            tools: vec![ToolSummary {
                name: "search_hotels".to_string(),
                description: "Search hotels & inns".to_string(),
            }],
            city: "Berkeley, CA, USA".to_string(),
            timezone: "America/Los_Angeles".to_string(),
            today: "2025-10-01".to_string(),
            trip_dates: trip_dates.map(str::to_string),
        }
    }

    #[test]
    fn test_render_plan_lists_tools_unescaped() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader.render("plan", &plan_context(None)).unwrap();
        assert!(prompt.contains("- search_hotels: Search hotels & inns"));
        assert!(prompt.contains("home metro (Berkeley, CA, USA)"));
        assert!(prompt.contains("Today is 2025-10-01"));
        assert!(!prompt.contains("already established"));
        // literal JSON in the template survives rendering
        assert!(prompt.contains(r#"{"tool_name": "search_flights""#));
    }

    #[test]
    fn test_render_plan_with_trip_dates() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader
            .render("plan", &plan_context(Some("2025-11-21 to 2025-11-23")))
            .unwrap();
        assert!(prompt.contains("already established: 2025-11-21 to 2025-11-23"));
    }

    #[test]
    fn test_render_synthesize() {
        let loader = PromptLoader::embedded_only();
        let ctx = SynthesisPromptContext {
            timezone: "America/Chicago".to_string(),
            buffer_minutes: 30,
        };
        let prompt = loader.render("synthesize", &ctx).unwrap();
        assert!(prompt.contains("at least 30 minutes between activities"));
        assert!(prompt.contains("America/Chicago"));
    }

    #[test]
    fn test_user_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let prompts = dir.path().join(".wayfarer/prompts");
        std::fs::create_dir_all(&prompts).unwrap();
        std::fs::write(prompts.join("refine.pmt"), "custom refine").unwrap();

        let loader = PromptLoader::new(dir.path());
        assert_eq!(loader.render("refine", &RefinePromptContext::default()).unwrap(), "custom refine");
        // templates without an override still come from the binary
        assert!(loader.render("synthesize", &RefinePromptContext::default()).is_ok());
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.render("nonexistent-template", &RefinePromptContext::default()).is_err());
    }
}
