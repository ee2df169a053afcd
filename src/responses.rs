//! Shapes a candidate's task lists into per-domain response blocks for display.
//!
//! Slot 0 of every task is the candidate's submitted work and gets link detection;
//! the remaining slots are numbered technical questions whose answers stay plain text.

use crate::model::{Candidate, Domain, RoundLevel, Task, QUESTION_SLOTS};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

static URL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn url_pattern() -> &'static Regex {
    URL_PATTERN.get_or_init(|| Regex::new(r"https?://\S+").expect("url pattern"))
}

/// A piece of free text: either plain text or an actionable link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Segment {
    Text(String),
    Link(String),
}

impl Segment {
    pub fn as_str(&self) -> &str {
        match self {
            Segment::Text(s) | Segment::Link(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedWork {
    pub prompt: String,
    pub answer: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionCard {
    /// 1-based slot position among the numbered questions.
    pub number: usize,
    pub prompt: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapedTask {
    pub subdomains: Vec<String>,
    pub submitted_work: Option<SubmittedWork>,
    pub questions: Vec<QuestionCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainResponses {
    pub domain: Domain,
    pub level: RoundLevel,
    pub tasks: Vec<ShapedTask>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapedResponses {
    pub domains: Vec<DomainResponses>,
}

impl ShapedResponses {
    pub fn get(&self, domain: Domain) -> Option<&DomainResponses> {
        self.domains.iter().find(|d| d.domain == domain)
    }

    /// Every link found in submitted work, in display order.
    pub fn submitted_links(&self) -> Vec<&str> {
        self.domains
            .iter()
            .flat_map(|d| d.tasks.iter())
            .filter_map(|t| t.submitted_work.as_ref())
            .flat_map(|w| w.answer.iter())
            .filter_map(|s| match s {
                Segment::Link(url) => Some(url.as_str()),
                Segment::Text(_) => None,
            })
            .collect()
    }
}

/// Shape every domain that has tasks. `None` when no domain has any.
pub fn shape(candidate: &Candidate) -> Option<ShapedResponses> {
    let domains: Vec<DomainResponses> = Domain::ALL
        .iter()
        .copied()
        .filter(|d| !candidate.tasks(*d).is_empty())
        .map(|domain| DomainResponses {
            domain,
            level: candidate.level(domain),
            tasks: candidate.tasks(domain).iter().map(shape_task).collect(),
        })
        .collect();

    if domains.is_empty() {
        None
    } else {
        Some(ShapedResponses { domains })
    }
}

pub fn shape_task(task: &Task) -> ShapedTask {
    let submitted_work = task.slot(0).map(|(prompt, answer)| SubmittedWork {
        prompt,
        answer: linkify(&answer),
    });

    let questions = (1..QUESTION_SLOTS.len())
        .filter_map(|index| {
            task.slot(index).map(|(prompt, answer)| QuestionCard {
                number: index,
                prompt,
                answer,
            })
        })
        .collect();

    ShapedTask {
        subdomains: shape_subdomains(&task.subdomain),
        submitted_work,
        questions,
    }
}

/// Split comma-joined tags, drop empty fragments, title-case the rest.
pub fn shape_subdomains<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    raw.iter()
        .flat_map(|tag| tag.as_ref().split(','))
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(capitalize)
        .collect()
}

/// Upper-case the first character, leave the rest untouched.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split `text` into plain and link segments. Concatenating the result gives `text` back.
pub fn linkify(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for m in url_pattern().find_iter(text) {
        if m.start() > last {
            segments.push(Segment::Text(text[last..m.start()].to_string()));
        }
        segments.push(Segment::Link(m.as_str().to_string()));
        last = m.end();
    }

    if last < text.len() {
        segments.push(Segment::Text(text[last..].to_string()));
    }
    segments
}
