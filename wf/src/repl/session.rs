//! REPL session management

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::domain::{ConversationTurn, ItineraryItem, Location, PlanRequest, PlanResponse, PlanStatus, RefineRequest};
use crate::pipeline::{Planner, Refiner};
use crate::render::response_text;

/// Profile field editable with `/profile <field> <value>`
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileField {
    City(String),
    Latitude(f64),
    Longitude(f64),
    Timezone(String),
}

/// A parsed line of input
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    Help,
    Quit,
    Clear,
    ShowItinerary,
    Refine,
    ShowProfile,
    SetProfile(ProfileField),
    Invalid(String),
    Goal(String),
}

impl ChatCommand {
    /// Parse one trimmed, non-empty line
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if !input.starts_with('/') {
            return ChatCommand::Goal(input.to_string());
        }

        let (cmd, rest) = input.split_once(char::is_whitespace).unwrap_or((input, ""));
        let rest = rest.trim();
        match cmd {
            "/help" | "/h" => ChatCommand::Help,
            "/quit" | "/q" | "/exit" => ChatCommand::Quit,
            "/clear" | "/c" => ChatCommand::Clear,
            "/itinerary" | "/i" => ChatCommand::ShowItinerary,
            "/refine" | "/r" => ChatCommand::Refine,
            "/profile" | "/p" if rest.is_empty() => ChatCommand::ShowProfile,
            "/profile" | "/p" => Self::parse_profile(rest),
            _ => ChatCommand::Invalid(format!("Unknown command: {}", cmd)),
        }
    }

    fn parse_profile(args: &str) -> Self {
        let (field, value) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
        let value = value.trim();
        if value.is_empty() {
            return ChatCommand::Invalid(format!("Missing value for profile field '{}'", field));
        }
        let number = |v: &str| v.parse::<f64>().map_err(|_| format!("Not a number: {}", v));
        let parsed = match field {
            "city" => Ok(ProfileField::City(value.to_string())),
            "lat" | "latitude" => number(value).map(ProfileField::Latitude),
            "lon" | "longitude" => number(value).map(ProfileField::Longitude),
            "tz" | "timezone" => Ok(ProfileField::Timezone(value.to_string())),
            other => Err(format!("Unknown profile field: {}", other)),
        };
        match parsed {
            Ok(field) => ChatCommand::SetProfile(field),
            Err(message) => ChatCommand::Invalid(message),
        }
    }
}

/// Whether the loop keeps going after a slash command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashResult {
    Continue,
    Quit,
}

/// Interactive planning session
pub struct ChatSession {
    planner: Planner,
    refiner: Refiner,
    conversation: Vec<ConversationTurn>,
    itinerary: Vec<ItineraryItem>,
    locations: Vec<Location>,
}

impl ChatSession {
    pub fn new(planner: Planner, refiner: Refiner) -> Self {
        Self {
            planner,
            refiner,
            conversation: Vec::new(),
            itinerary: Vec::new(),
            locations: Vec::new(),
        }
    }

    pub fn conversation(&self) -> &[ConversationTurn] {
        &self.conversation
    }

    pub fn itinerary(&self) -> &[ItineraryItem] {
        &self.itinerary
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome().await;

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            match rl.readline(&format!("{} ", ">".bright_green())) {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    if self.handle(ChatCommand::parse(input)).await == SlashResult::Quit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Execute one command, printing its output
    pub async fn handle(&mut self, command: ChatCommand) -> SlashResult {
        debug!(?command, "ChatSession::handle: called");
        match command {
            ChatCommand::Help => self.print_help(),
            ChatCommand::Quit => return SlashResult::Quit,
            ChatCommand::Clear => {
                self.clear();
                println!("{}", "Conversation and itinerary cleared.".dimmed());
            }
            ChatCommand::ShowItinerary => self.print_itinerary(),
            ChatCommand::Refine => {
                let response = self.refine().await;
                print!("{}", response_text(&response));
            }
            ChatCommand::ShowProfile => {
                let profile = self.planner.profiles().get().await;
                println!("{} {} ({}, {}) {}", "Profile:".bright_cyan(), profile.city, profile.latitude, profile.longitude, profile.timezone);
            }
            ChatCommand::SetProfile(field) => {
                self.set_profile(field).await;
                println!("{}", "Profile updated.".dimmed());
            }
            ChatCommand::Invalid(message) => {
                println!("{} {}", "?".yellow(), message);
                println!("Type {} for available commands", "/help".yellow());
            }
            ChatCommand::Goal(goal) => {
                println!("{}", "Planning...".dimmed());
                let response = self.plan(&goal).await;
                print!("{}", response_text(&response));
            }
        }
        SlashResult::Continue
    }

    /// Plan a goal in the context of the session, then fold the result in
    pub async fn plan(&mut self, goal: &str) -> PlanResponse {
        let request = PlanRequest {
            prompt: goal.to_string(),
            conversation_history: self.conversation.clone(),
            itinerary: self.itinerary.clone(),
            locations: self.locations.clone(),
        };
        let response = self.planner.plan(request).await;
        self.record(goal, &response);
        response
    }

    /// Refine the current itinerary in place
    pub async fn refine(&mut self) -> PlanResponse {
        let response = self
            .refiner
            .refine(RefineRequest {
                itinerary: self.itinerary.clone(),
                locations: self.locations.clone(),
            })
            .await;
        if response.status != PlanStatus::Error {
            self.itinerary = response.itinerary.clone();
            self.locations = response.locations.clone();
        }
        response
    }

    /// Record a turn; a non-error response with items replaces the trip
    pub fn record(&mut self, goal: &str, response: &PlanResponse) {
        self.conversation.push(ConversationTurn::user(goal));
        self.conversation.push(ConversationTurn::assistant(summarize(response)));
        if response.status != PlanStatus::Error && !response.itinerary.is_empty() {
            self.itinerary = response.itinerary.clone();
            self.locations = response.locations.clone();
        }
    }

    pub fn clear(&mut self) {
        self.conversation.clear();
        self.itinerary.clear();
        self.locations.clear();
    }

    async fn set_profile(&self, field: ProfileField) {
        let mut profile = self.planner.profiles().get().await;
        match field {
            ProfileField::City(city) => profile.city = city,
            ProfileField::Latitude(lat) => profile.latitude = lat,
            ProfileField::Longitude(lon) => profile.longitude = lon,
            ProfileField::Timezone(tz) => profile.timezone = tz,
        }
        self.planner.profiles().set(profile).await;
    }

    async fn print_welcome(&self) {
        let profile = self.planner.profiles().get().await;
        println!();
        println!("{}", "Wayfarer Interactive Planner".bright_cyan().bold());
        println!("Home: {}", profile.city);
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:26} Show this help", "/help".yellow());
        println!("  {:26} Exit the session", "/quit".yellow());
        println!("  {:26} Forget conversation and itinerary", "/clear".yellow());
        println!("  {:26} Show the current itinerary", "/itinerary".yellow());
        println!("  {:26} Refine the current itinerary", "/refine".yellow());
        println!("  {:26} Show the profile", "/profile".yellow());
        println!("  {:26} Set city, lat, lon or timezone", "/profile <field> <value>".yellow());
        println!();
        println!("Anything else is planned as a travel goal.");
        println!();
    }

    fn print_itinerary(&self) {
        if self.itinerary.is_empty() {
            println!("{}", "No itinerary yet.".dimmed());
            return;
        }
        let current = PlanResponse {
            itinerary: self.itinerary.clone(),
            locations: self.locations.clone(),
            ..Default::default()
        };
        print!("{}", response_text(&current));
    }
}

/// One-line assistant turn describing a response
pub fn summarize(response: &PlanResponse) -> String {
    match response.status {
        PlanStatus::Error => format!(
            "Planning failed: {}",
            response.logs.last().map(String::as_str).unwrap_or("unknown error")
        ),
        status => {
            let titles: Vec<&str> = response.itinerary.iter().map(|i| i.title.as_str()).collect();
            let mut out = format!("{} with {} item(s)", status.as_str(), titles.len());
            if !titles.is_empty() {
                out.push_str(&format!(": {}", titles.join(", ")));
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemType;
    use crate::profile::ProfileStore;
    use crate::testing::{MockLlmClient, MockSearchProvider};
    use std::sync::Arc;

    fn session(plan_replies: Vec<&str>, synth_replies: Vec<&str>) -> ChatSession {
        let planner = Planner::new(
            Arc::new(MockLlmClient::new(plan_replies)),
            Arc::new(MockLlmClient::new(synth_replies)),
            Arc::new(MockSearchProvider::new()),
            ProfileStore::default(),
        );
        ChatSession::new(planner, Refiner::deterministic())
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ChatCommand::parse("/help"), ChatCommand::Help);
        assert_eq!(ChatCommand::parse("/exit"), ChatCommand::Quit);
        assert_eq!(ChatCommand::parse("/itinerary"), ChatCommand::ShowItinerary);
        assert_eq!(ChatCommand::parse("/profile"), ChatCommand::ShowProfile);
        assert_eq!(
            ChatCommand::parse("/profile city Seattle, WA, USA"),
            ChatCommand::SetProfile(ProfileField::City("Seattle, WA, USA".to_string()))
        );
        assert_eq!(
            ChatCommand::parse("/profile lon -122.33"),
            ChatCommand::SetProfile(ProfileField::Longitude(-122.33))
        );
        assert!(matches!(ChatCommand::parse("/profile lat north"), ChatCommand::Invalid(_)));
        assert!(matches!(ChatCommand::parse("/profile city"), ChatCommand::Invalid(_)));
        assert!(matches!(ChatCommand::parse("/teleport"), ChatCommand::Invalid(_)));
        assert_eq!(
            ChatCommand::parse("weekend in Seattle"),
            ChatCommand::Goal("weekend in Seattle".to_string())
        );
    }

    #[test]
    fn test_summarize() {
        let response = PlanResponse {
            itinerary: vec![ItineraryItem::new("Museum", "2025-11-21T10:00:00", ItemType::Activity)],
            ..Default::default()
        };
        assert_eq!(summarize(&response), "success with 1 item(s): Museum");
        let failed = PlanResponse::error(vec!["Error in planning phase: boom".to_string()]);
        assert_eq!(summarize(&failed), "Planning failed: Error in planning phase: boom");
    }

    #[tokio::test]
    async fn test_plan_turn_carries_state() {
        let mut session = session(
            vec![
                r#"{"tool_name":"search_events","query":"museums in Seattle"}]"#,
                r#"{"tool_name":"search_events","query":"jazz in Seattle"}]"#,
            ],
            vec![
                r#""status":"success","itinerary":[{"id":"m","title":"Museum","startTime":"2025-11-21T10:00:00"}],"locations":[],"logs":[]}"#,
                r#""status":"success","itinerary":[],"locations":[],"logs":[]}"#,
            ],
        );

        session.plan("Weekend in Seattle").await;
        assert_eq!(session.itinerary().len(), 1);
        assert_eq!(session.conversation().len(), 2);

        // an empty follow-up draft keeps the current trip
        session.plan("add a jazz night").await;
        assert_eq!(session.itinerary()[0].title, "Museum");
        assert_eq!(session.conversation().len(), 4);
        assert!(session.conversation()[1].is_assistant());

        session.clear();
        assert!(session.itinerary().is_empty());
        assert!(session.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_set_profile_updates_store() {
        let mut session = session(vec![], vec![]);
        let result = session
            .handle(ChatCommand::SetProfile(ProfileField::City("Portland, OR".to_string())))
            .await;
        assert_eq!(result, SlashResult::Continue);
        assert_eq!(session.planner.profiles().get().await.city, "Portland, OR");
        assert_eq!(session.handle(ChatCommand::Quit).await, SlashResult::Quit);
    }
}
