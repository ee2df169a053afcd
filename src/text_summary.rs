//! Text summary builder for CLI output.
//!
//! Formats a processed candidate into human-readable lines for text mode.

use crate::model::Domain;
use crate::orchestrator::CandidateView;
use crate::responses::{DomainResponses, Segment};

/// Pre-formatted lines for text output.
pub struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary covering both the profile and the application responses.
pub fn build_text_summary(view: &CandidateView) -> TextSummary {
    let mut lines = Vec::new();
    let p = &view.profile;

    lines.push(format!("{} ({})", p.display_name, p.regno));
    lines.push(format!("Membership: {}", p.tier));
    lines.push(format!("Email: {}", p.email));
    lines.push(format!("Personal email: {}", p.personal_email));
    lines.push(format!("Mobile: {}", p.mobile));
    lines.push(format!("Applied domains: {}", join_or_none(&p.applied_domains)));
    lines.push(format!(
        "Rounds: {}",
        Domain::ALL
            .iter()
            .map(|d| format!("{} {}", d.title(), p.levels.get(*d)))
            .collect::<Vec<_>>()
            .join(" | ")
    ));
    lines.push(format!(
        "Participated events: {}",
        p.participated_events.as_deref().map_or("None".into(), join_or_none)
    ));
    lines.push(format!(
        "Volunteered events: {}",
        p.volunteered_events.as_deref().map_or("None".into(), join_or_none)
    ));

    match view.responses.as_ref() {
        Some(responses) => {
            for domain in &responses.domains {
                lines.push(String::new());
                push_domain(&mut lines, domain);
            }
        }
        None => {
            lines.push(String::new());
            lines.push("No application responses".into());
        }
    }

    TextSummary { lines }
}

fn push_domain(lines: &mut Vec<String>, domain: &DomainResponses) {
    lines.push(format!(
        "== {} (Current Level: {}) ==",
        domain.domain.title(),
        domain.level
    ));
    for (i, task) in domain.tasks.iter().enumerate() {
        if task.subdomains.is_empty() {
            lines.push(format!("Task {}", i + 1));
        } else {
            lines.push(format!("Task {} [{}]", i + 1, task.subdomains.join(", ")));
        }
        if let Some(work) = task.submitted_work.as_ref() {
            lines.push(format!("  Submitted Tasks: {}", work.prompt));
            let answer: String = work
                .answer
                .iter()
                .map(|s| match s {
                    Segment::Link(url) => format!("<{url}>"),
                    Segment::Text(t) => t.clone(),
                })
                .collect();
            lines.push(format!("    {answer}"));
        }
        for q in &task.questions {
            lines.push(format!("  Q{}. {}", q.number, q.prompt));
            lines.push(format!("    {}", q.answer));
        }
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".into()
    } else {
        items.join(", ")
    }
}
