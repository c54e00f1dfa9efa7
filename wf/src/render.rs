//! Terminal rendering for plan, refine and profile output

use colored::Colorize;
use eyre::{Context, Result};

use crate::cli::OutputFormat;
use crate::domain::{ItineraryItem, PlanResponse, PlanStatus};
use crate::profile::UserProfile;
use crate::scheduler::parse_local;

fn when(item: &ItineraryItem) -> String {
    let Some(start) = parse_local(&item.start_time) else {
        return item.start_time.clone();
    };
    let mut out = start.format("%a %b %d %H:%M").to_string();
    if let Some(end) = item.end_time.as_deref().and_then(parse_local) {
        if end.date() == start.date() {
            out.push_str(&format!("-{}", end.format("%H:%M")));
        } else {
            out.push_str(&format!(" - {}", end.format("%a %b %d %H:%M")));
        }
    }
    out
}

fn status_label(status: PlanStatus) -> colored::ColoredString {
    match status {
        PlanStatus::Success => status.as_str().green().bold(),
        PlanStatus::NeedsClarification => status.as_str().yellow().bold(),
        PlanStatus::Error => status.as_str().red().bold(),
    }
}

/// Human-readable response
pub fn response_text(response: &PlanResponse) -> String {
    let mut out = format!("{} {}\n", "Status:".bright_cyan(), status_label(response.status));

    if !response.itinerary.is_empty() {
        out.push_str(&format!("\n{}\n", "Itinerary".bright_cyan().bold()));
        for item in &response.itinerary {
            out.push_str(&format!(
                "  {:<28} {} {}\n",
                when(item),
                item.title.bold(),
                format!("[{}]", item.item_type.as_str()).dimmed()
            ));
            if !item.description.trim().is_empty() {
                out.push_str(&format!("  {:<28} {}\n", "", item.description.trim().dimmed()));
            }
        }
    }

    if !response.options.is_empty() {
        out.push_str(&format!("\n{}\n", "Options".bright_cyan().bold()));
        for option in &response.options {
            let detail = if option.description.is_empty() {
                String::new()
            } else {
                format!(" - {}", option.description)
            };
            out.push_str(&format!(
                "  {} {}{}\n",
                format!("[{}]", option.kind.as_str()).yellow(),
                option.title,
                detail.dimmed()
            ));
        }
    }

    if !response.locations.is_empty() {
        out.push_str(&format!("\n{}\n", "Locations".bright_cyan().bold()));
        for loc in &response.locations {
            out.push_str(&format!("  {} ({:.4}, {:.4})\n", loc.name, loc.latitude, loc.longitude));
        }
    }

    if !response.logs.is_empty() {
        out.push_str(&format!("\n{}\n", "Logs".bright_cyan().bold()));
        for line in &response.logs {
            out.push_str(&format!("  {}\n", line.dimmed()));
        }
    }
    out
}

/// Render a plan or refine response
pub fn render_response(response: &PlanResponse, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(response).context("Failed to serialize response"),
        OutputFormat::Text => Ok(response_text(response)),
    }
}

/// Render a profile
pub fn render_profile(profile: &UserProfile, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(profile).context("Failed to serialize profile"),
        OutputFormat::Text => Ok(format!(
            "{} {}\n{} {}, {}\n{} {}\n",
            "City:".bright_cyan(),
            profile.city,
            "Coordinates:".bright_cyan(),
            profile.latitude,
            profile.longitude,
            "Timezone:".bright_cyan(),
            profile.timezone
        )),
    }
}
