use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

/// Review track a candidate applies under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Tech,
    Design,
    Management,
}

impl Domain {
    /// Fixed presentation and wire order.
    pub const ALL: [Domain; 3] = [Domain::Tech, Domain::Design, Domain::Management];

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Tech => "tech",
            Domain::Design => "design",
            Domain::Management => "management",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Domain::Tech => "Tech",
            Domain::Design => "Design",
            Domain::Management => "Management",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown domain '{0}' (expected tech, design or management)")]
pub struct ParseDomainError(pub String);

impl FromStr for Domain {
    type Err = ParseDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tech" => Ok(Domain::Tech),
            "design" => Ok(Domain::Design),
            "management" => Ok(Domain::Management),
            _ => Err(ParseDomainError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("round level {0} is outside 0..=3")]
pub struct InvalidRoundLevel(pub i64);

/// Position of a candidate in one domain's review pipeline (0..=3).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "u8")]
pub struct RoundLevel(u8);

impl RoundLevel {
    pub const ZERO: RoundLevel = RoundLevel(0);
    pub const MAX: RoundLevel = RoundLevel(3);

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX.0).then_some(RoundLevel(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn is_max(self) -> bool {
        self == Self::MAX
    }

    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    /// The following round, or `None` at the final round.
    pub fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }
}

impl TryFrom<i64> for RoundLevel {
    type Error = InvalidRoundLevel;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(RoundLevel::new)
            .ok_or(InvalidRoundLevel(value))
    }
}

impl From<RoundLevel> for u8 {
    fn from(level: RoundLevel) -> Self {
        level.0
    }
}

impl fmt::Display for RoundLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The level triple the status endpoint always receives in full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundLevels {
    pub tech: RoundLevel,
    pub design: RoundLevel,
    pub management: RoundLevel,
}

impl RoundLevels {
    pub fn get(&self, domain: Domain) -> RoundLevel {
        match domain {
            Domain::Tech => self.tech,
            Domain::Design => self.design,
            Domain::Management => self.management,
        }
    }

    /// Copy of `self` with only `domain` replaced.
    pub fn with(mut self, domain: Domain, level: RoundLevel) -> Self {
        match domain {
            Domain::Tech => self.tech = level,
            Domain::Design => self.design = level,
            Domain::Management => self.management = level,
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipTier {
    Regular,
    JuniorCore,
    SeniorCore,
}

impl MembershipTier {
    /// Senior core wins when both flags are set.
    pub fn from_flags(is_senior_core: bool, is_junior_core: bool) -> Self {
        if is_senior_core {
            MembershipTier::SeniorCore
        } else if is_junior_core {
            MembershipTier::JuniorCore
        } else {
            MembershipTier::Regular
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MembershipTier::Regular => "Regular Member",
            MembershipTier::JuniorCore => "Junior Core",
            MembershipTier::SeniorCore => "Senior Core",
        }
    }
}

/// Slot keys in render order; index 0 is the submitted-work slot.
pub const QUESTION_SLOTS: [&str; 17] = [
    "question1",
    "question2",
    "question3",
    "question4",
    "question5",
    "question6",
    "question7",
    "question8",
    "question9",
    "question10",
    "question11",
    "question12",
    "question13",
    "question14",
    "question15",
    "question16",
    "question17",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, deserialize_with = "null_as_default")]
    pub subdomain: Vec<String>,
    /// Question slots and any other keys the server attaches.
    #[serde(flatten)]
    pub slots: BTreeMap<String, Value>,
}

impl Task {
    /// `(prompt, answer)` for the slot at `index`, when the slot holds a usable pair.
    pub fn slot(&self, index: usize) -> Option<(String, String)> {
        let key = QUESTION_SLOTS.get(index)?;
        let items = self.slots.get(*key)?.as_array()?;
        if items.len() < 2 {
            return None;
        }
        Some((scalar_text(&items[0])?, scalar_text(&items[1])?))
    }
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub regno: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "emailpersonal", default)]
    pub personal_email: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub mobile: Option<String>,
    #[serde(rename = "isSC", default, deserialize_with = "null_as_default")]
    pub is_senior_core: bool,
    #[serde(rename = "isJC", default, deserialize_with = "null_as_default")]
    pub is_junior_core: bool,
    #[serde(rename = "domain", default, deserialize_with = "null_as_default")]
    pub applied_domains: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tech: RoundLevel,
    #[serde(default, deserialize_with = "null_as_default")]
    pub design: RoundLevel,
    #[serde(default, deserialize_with = "null_as_default")]
    pub management: RoundLevel,
    #[serde(rename = "techTasks", default, deserialize_with = "null_as_default")]
    pub tech_tasks: Vec<Task>,
    #[serde(rename = "designTasks", default, deserialize_with = "null_as_default")]
    pub design_tasks: Vec<Task>,
    #[serde(
        rename = "managementTasks",
        default,
        deserialize_with = "null_as_default"
    )]
    pub management_tasks: Vec<Task>,
    #[serde(rename = "participatedEvent", default)]
    pub participated_events: Option<String>,
    #[serde(rename = "volunteeredEvent", default)]
    pub volunteered_events: Option<String>,
}

impl Candidate {
    pub fn tier(&self) -> MembershipTier {
        MembershipTier::from_flags(self.is_senior_core, self.is_junior_core)
    }

    pub fn levels(&self) -> RoundLevels {
        RoundLevels {
            tech: self.tech,
            design: self.design,
            management: self.management,
        }
    }

    pub fn level(&self, domain: Domain) -> RoundLevel {
        self.levels().get(domain)
    }

    pub fn tasks(&self, domain: Domain) -> &[Task] {
        match domain {
            Domain::Tech => &self.tech_tasks,
            Domain::Design => &self.design_tasks,
            Domain::Management => &self.management_tasks,
        }
    }
}

/// Envelope returned by the search endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<Candidate>,
}

impl SearchEnvelope {
    /// First record of a successful envelope.
    pub fn into_first(self) -> Option<Candidate> {
        if !self.success {
            return None;
        }
        self.data.into_iter().next()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regno: Option<String>,
    pub tech: u8,
    pub design: u8,
    pub management: u8,
}

impl StatusUpdate {
    pub fn new(regno: Option<String>, levels: RoundLevels) -> Self {
        Self {
            regno,
            tech: levels.tech.get(),
            design: levels.design.get(),
            management: levels.management.get(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(rename = "refreshToken", default)]
    pub refresh_token: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    Promote,
    Reject,
}

/// Which candidate pane is showing; exactly one at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewTab {
    #[default]
    Profile,
    Responses,
}

impl ViewTab {
    pub fn toggled(self) -> Self {
        match self {
            ViewTab::Profile => ViewTab::Responses,
            ViewTab::Responses => ViewTab::Profile,
        }
    }
}

/// Everything the controller owns; presentation layers only see clones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerState {
    pub query: String,
    pub candidate: Option<Candidate>,
    pub loading: bool,
    pub error: Option<String>,
    pub tab: ViewTab,
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    // Box to keep the event small; a candidate record carries every task.
    State(Box<ControllerState>),
    Info(InfoEvent),
    /// A search or round command has run to completion, re-fetch included.
    Settled,
}

/// Structured notices emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoEvent {
    Message(String),
    Promoted { domain: Domain, level: RoundLevel },
    Rejected { domain: Domain },
    TransitionSkipped { domain: Domain, transition: Transition },
    TransitionFailed { domain: Domain },
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::Promoted { domain, level } => {
                format!("Promoted {} to round {}", domain.title(), level)
            }
            InfoEvent::Rejected { domain } => {
                format!("Rejected {} (reset to round 0)", domain.title())
            }
            InfoEvent::TransitionSkipped {
                domain,
                transition: Transition::Promote,
            } => format!("{} is already at the final round", domain.title()),
            InfoEvent::TransitionSkipped {
                domain,
                transition: Transition::Reject,
            } => format!("{} is already at round 0", domain.title()),
            InfoEvent::TransitionFailed { domain } => {
                format!("Round update for {} failed (see log)", domain.title())
            }
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
