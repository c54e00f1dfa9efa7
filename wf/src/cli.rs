//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::profile::UserProfile;

/// Wayfarer - turn a travel goal into an itinerary
#[derive(Debug, Parser)]
#[command(
    name = "wf",
    about = "Turn a free-text travel goal into a conflict-free itinerary",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Profile overrides applied on top of the configured profile
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ProfileArgs {
    /// Home city, e.g. "Seattle, WA, USA"
    #[arg(long, global = true)]
    pub city: Option<String>,

    /// Home latitude
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Home longitude
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Home timezone, e.g. America/Los_Angeles
    #[arg(long, global = true)]
    pub timezone: Option<String>,
}

impl ProfileArgs {
    /// Apply the overrides that were given
    pub fn apply(&self, mut profile: UserProfile) -> UserProfile {
        debug!(?self, "ProfileArgs::apply: called");
        if let Some(city) = &self.city {
            profile.city = city.clone();
        }
        if let Some(lat) = self.lat {
            profile.latitude = lat;
        }
        if let Some(lon) = self.lon {
            profile.longitude = lon;
        }
        if let Some(tz) = &self.timezone {
            profile.timezone = tz.clone();
        }
        profile
    }
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan a trip from a free-text goal
    Plan {
        /// The travel goal, e.g. "weekend in Seattle Nov 21-23, indoor stuff"
        goal: String,

        /// JSON file with prior conversation turns ([{role, content}])
        #[arg(long, value_name = "FILE")]
        history: Option<PathBuf>,

        /// JSON file with the current itinerary (items, or {itinerary, locations})
        #[arg(long, value_name = "FILE")]
        itinerary: Option<PathBuf>,
    },

    /// Validate and clean a user-edited itinerary
    Refine {
        /// JSON file with {itinerary, locations}
        file: PathBuf,
    },

    /// Show the effective user profile
    Profile,

    /// Interactive planning session
    Chat,
}

/// Output format for plan, refine and profile
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Path of the log file written by `wf`
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wayfarer")
        .join("logs")
        .join("wayfarer.log")
}
