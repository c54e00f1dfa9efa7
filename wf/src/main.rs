//! Wayfarer - goal-to-itinerary planner
//!
//! CLI entry point for planning, refining and interactive sessions.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use eyre::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use wayfarer::cli::{Cli, Command, OutputFormat, get_log_path};
use wayfarer::config::Config;
use wayfarer::domain::{ConversationTurn, ItineraryItem, PlanRequest, RefineRequest};
use wayfarer::pipeline::{Planner, Refiner};
use wayfarer::profile::{ProfileStore, UserProfile};
use wayfarer::prompts::PromptLoader;
use wayfarer::render::{render_profile, render_response};
use wayfarer::repl;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

/// `--itinerary` accepts a bare item list or a full trip
#[derive(Deserialize)]
#[serde(untagged)]
enum TripInput {
    Items(Vec<ItineraryItem>),
    Trip(RefineRequest),
}

impl TripInput {
    fn into_trip(self) -> RefineRequest {
        match self {
            TripInput::Items(itinerary) => RefineRequest {
                itinerary,
                locations: Vec::new(),
            },
            TripInput::Trip(trip) => trip,
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).context(format!("Failed to parse {}", path.display()))
}

fn prompt_loader() -> Result<PromptLoader> {
    let root = std::env::current_dir().context("Failed to read current directory")?;
    Ok(PromptLoader::new(root))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    config.profile = cli.profile.apply(config.profile.clone());
    info!(city = %config.profile.city, "Wayfarer loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Plan {
            goal,
            history,
            itinerary,
        } => {
            debug!(%goal, "main: matched Plan command");
            cmd_plan(&config, goal, history, itinerary, cli.format).await
        }
        Command::Refine { file } => {
            debug!(file = %file.display(), "main: matched Refine command");
            cmd_refine(&config, &file, cli.format).await
        }
        Command::Profile => {
            debug!("main: matched Profile command");
            cmd_profile(&config.profile, cli.format)
        }
        Command::Chat => {
            debug!("main: matched Chat command");
            repl::run_interactive(&config).await
        }
    }
}

async fn cmd_plan(
    config: &Config,
    goal: String,
    history: Option<PathBuf>,
    itinerary: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    debug!(?history, ?itinerary, "cmd_plan: called");
    let mut request = PlanRequest::new(goal);
    if let Some(path) = history {
        request.conversation_history = read_json::<Vec<ConversationTurn>>(&path)?;
    }
    if let Some(path) = itinerary {
        let trip = read_json::<TripInput>(&path)?.into_trip();
        request.itinerary = trip.itinerary;
        request.locations = trip.locations;
    }

    let profiles = ProfileStore::new(config.profile.clone());
    let planner = Planner::from_config(config, profiles, prompt_loader()?)?;
    let response = planner.plan(request).await;

    println!("{}", render_response(&response, format)?);
    Ok(())
}

async fn cmd_refine(config: &Config, file: &Path, format: OutputFormat) -> Result<()> {
    debug!(file = %file.display(), "cmd_refine: called");
    let request: RefineRequest = read_json(file)?;
    let refiner = Refiner::from_config(config, prompt_loader()?).context("Failed to create refiner")?;
    let response = refiner.refine(request).await;

    println!("{}", render_response(&response, format)?);
    Ok(())
}

fn cmd_profile(profile: &UserProfile, format: OutputFormat) -> Result<()> {
    debug!("cmd_profile: called");
    println!("{}", render_profile(profile, format)?);
    Ok(())
}
