//! Interactive planning session
//!
//! Keeps conversation, itinerary and profile across turns so follow-up goals
//! ("add a jazz night", "make it cheaper") build on the current trip.

mod session;

pub use session::{ChatCommand, ChatSession, ProfileField, SlashResult};

use eyre::{Context, Result};

use crate::config::Config;
use crate::pipeline::{Planner, Refiner};
use crate::profile::ProfileStore;
use crate::prompts::PromptLoader;

/// Run the interactive REPL
///
/// This is the entry point for `wf chat`.
pub async fn run_interactive(config: &Config) -> Result<()> {
    let root = std::env::current_dir().context("Failed to read current directory")?;
    let profiles = ProfileStore::new(config.profile.clone());
    let planner = Planner::from_config(config, profiles, PromptLoader::new(&root))?;
    let refiner = Refiner::from_config(config, PromptLoader::new(&root)).context("Failed to create refiner")?;

    let mut session = ChatSession::new(planner, refiner);
    session.run().await
}
