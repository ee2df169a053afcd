//! Post-fetch processing.
//!
//! Turns a fetched candidate into a presentation-ready view and handles exports, so the
//! TUI and the CLI modes render exactly the same data.

use crate::model::{Candidate, Domain, RoundLevels};
use crate::responses::{self, ShapedResponses};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

pub const UNNAMED_CANDIDATE: &str = "Unnamed Candidate";
pub const NOT_PROVIDED: &str = "Not provided";

/// Identity and membership block of the candidate view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    pub id: String,
    pub display_name: String,
    pub avatar_initial: char,
    pub regno: String,
    pub tier: &'static str,
    pub email: String,
    pub personal_email: String,
    pub mobile: String,
    pub applied_domains: Vec<String>,
    pub levels: RoundLevels,
    /// `None` when the record carries no participation history.
    pub participated_events: Option<Vec<String>>,
    pub volunteered_events: Option<Vec<String>>,
}

/// A fetched candidate, ready for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateView {
    pub fetched_at: String,
    pub profile: ProfileView,
    pub responses: Option<ShapedResponses>,
}

/// Shape `candidate` for display. `query` fills in a missing registration number.
pub fn process_candidate(candidate: &Candidate, query: &str) -> CandidateView {
    CandidateView {
        fetched_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        profile: shape_profile(candidate, query),
        responses: responses::shape(candidate),
    }
}

pub fn shape_profile(candidate: &Candidate, query: &str) -> ProfileView {
    let name = candidate
        .username
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    ProfileView {
        id: candidate.id.clone(),
        display_name: name.unwrap_or(UNNAMED_CANDIDATE).to_string(),
        avatar_initial: name
            .and_then(|n| n.chars().next())
            .map(|c| c.to_uppercase().next().unwrap_or(c))
            .unwrap_or('C'),
        regno: candidate
            .regno
            .clone()
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| query.to_string()),
        tier: candidate.tier().label(),
        email: or_not_provided(candidate.email.as_deref()),
        personal_email: or_not_provided(candidate.personal_email.as_deref()),
        mobile: or_not_provided(candidate.mobile.as_deref()),
        applied_domains: candidate
            .applied_domains
            .iter()
            .map(|d| match d.parse::<Domain>() {
                Ok(domain) => domain.title().to_string(),
                Err(_) => responses::capitalize(d.trim()),
            })
            .collect(),
        levels: candidate.levels(),
        participated_events: event_tags(candidate.participated_events.as_deref()),
        volunteered_events: event_tags(candidate.volunteered_events.as_deref()),
    }
}

fn or_not_provided(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_PROVIDED)
        .to_string()
}

/// Split a comma-delimited history field into tags.
pub fn event_tags(raw: Option<&str>) -> Option<Vec<String>> {
    let tags: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    if tags.is_empty() {
        None
    } else {
        Some(tags)
    }
}

/// Write the view as pretty JSON.
pub fn export_json(path: &Path, view: &CandidateView) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let body = serde_json::to_string_pretty(view).context("failed to serialize candidate")?;
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
