use crate::model::{ControllerEvent, ControllerState, Domain, InfoEvent, Transition, ViewTab};
use crate::orchestrator::{self, CandidateView, UiCommand};
use crate::regno;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    style::Color,
    style::Style,
    text::{Line, Span},
};

#[derive(Default)]
pub struct UiState {
    /// Last snapshot published by the controller.
    pub snapshot: ControllerState,
    /// Presentation view of `snapshot.candidate`, rebuilt whenever the record changes.
    pub view: Option<CandidateView>,
    pub input: String,
    pub editing: bool,
    pub show_help: bool,
    pub selected_domain: Option<Domain>,
    pub scroll: u16,
    pub info: String,
    pub operator: Option<String>,
    pub authenticated: bool,
    /// A search or round command was sent and the controller has not settled it yet.
    pub pending: bool,
}

/// What the terminal loop should do after a key press.
#[derive(Debug)]
pub enum KeyOutcome {
    Continue,
    Send(UiCommand),
    Quit,
}

pub fn apply_event(state: &mut UiState, ev: ControllerEvent) {
    match ev {
        ControllerEvent::State(snapshot) => state.apply_snapshot(*snapshot),
        ControllerEvent::Info(info) => state.info = info.to_message(),
        ControllerEvent::Settled => state.pending = false,
    }
}

impl UiState {
    pub fn apply_snapshot(&mut self, snapshot: ControllerState) {
        let previous_id = self.snapshot.candidate.as_ref().map(|c| c.id.clone());
        let changed = self.snapshot.candidate != snapshot.candidate;

        if changed {
            self.view = snapshot
                .candidate
                .as_ref()
                .map(|c| orchestrator::process_candidate(c, &snapshot.query));
        }

        let new_id = snapshot.candidate.as_ref().map(|c| c.id.clone());
        if new_id != previous_id {
            self.scroll = 0;
            self.selected_domain = self.domains().first().copied();
        }
        if snapshot.tab != self.snapshot.tab {
            self.scroll = 0;
        }
        self.snapshot = snapshot;
    }

    /// Domains that have responses, in display order.
    pub fn domains(&self) -> Vec<Domain> {
        self.view
            .as_ref()
            .and_then(|v| v.responses.as_ref())
            .map(|r| r.domains.iter().map(|d| d.domain).collect())
            .unwrap_or_default()
    }

    /// Hint shown under the search field while the input does not validate.
    pub fn input_hint(&self) -> Option<&'static str> {
        if !self.input.is_empty() && !regno::is_valid(&self.input) {
            Some(regno::FORMAT_HINT)
        } else {
            None
        }
    }

    /// True while a request is in flight or queued behind the controller.
    pub fn busy(&self) -> bool {
        self.pending || self.snapshot.loading
    }

    pub fn can_transition(&self, domain: Domain, transition: Transition) -> bool {
        if self.busy() {
            return false;
        }
        match self.snapshot.candidate.as_ref() {
            Some(c) => match transition {
                Transition::Promote => !c.level(domain).is_max(),
                Transition::Reject => !c.level(domain).is_zero(),
            },
            None => false,
        }
    }

    fn cycle_domain(&mut self, forward: bool) {
        let domains = self.domains();
        if domains.is_empty() {
            return;
        }
        let pos = self
            .selected_domain
            .and_then(|d| domains.iter().position(|x| *x == d))
            .unwrap_or(0);
        let next = if forward {
            (pos + 1) % domains.len()
        } else {
            (pos + domains.len() - 1) % domains.len()
        };
        self.selected_domain = Some(domains[next]);
    }

    fn request_transition(&mut self, transition: Transition) -> KeyOutcome {
        if self.snapshot.tab != ViewTab::Responses || self.show_help {
            self.info = "Switch to Application Responses (tab) to change rounds".into();
            return KeyOutcome::Continue;
        }
        let Some(domain) = self.selected_domain else {
            self.info = "No domain selected".into();
            return KeyOutcome::Continue;
        };
        if self.busy() {
            return KeyOutcome::Continue;
        }
        if !self.can_transition(domain, transition) {
            self.info = InfoEvent::TransitionSkipped { domain, transition }.to_message();
            return KeyOutcome::Continue;
        }
        self.pending = true;
        KeyOutcome::Send(match transition {
            Transition::Promote => UiCommand::Promote(domain),
            Transition::Reject => UiCommand::Reject(domain),
        })
    }

    fn submit_search(&mut self) -> KeyOutcome {
        self.editing = false;
        if self.busy() {
            return KeyOutcome::Continue;
        }
        self.show_help = false;
        self.pending = true;
        KeyOutcome::Send(UiCommand::Search(self.input.clone()))
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyOutcome::Quit;
        }

        if self.editing {
            match key.code {
                KeyCode::Enter => return self.submit_search(),
                KeyCode::Esc => self.editing = false,
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Char(c) if !c.is_whitespace() => {
                    self.input.extend(c.to_uppercase());
                }
                _ => {}
            }
            return KeyOutcome::Continue;
        }

        match key.code {
            KeyCode::Char('q') => KeyOutcome::Quit,
            KeyCode::Char('/') => {
                self.editing = true;
                KeyOutcome::Continue
            }
            KeyCode::Enter => self.submit_search(),
            KeyCode::Tab | KeyCode::BackTab => {
                self.show_help = false;
                KeyOutcome::Send(UiCommand::SelectTab(self.snapshot.tab.toggled()))
            }
            KeyCode::Char('?') => {
                self.show_help = !self.show_help;
                KeyOutcome::Continue
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.cycle_domain(false);
                KeyOutcome::Continue
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.cycle_domain(true);
                KeyOutcome::Continue
            }
            KeyCode::Char('p') => self.request_transition(Transition::Promote),
            KeyCode::Char('x') => self.request_transition(Transition::Reject),
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll = self.scroll.saturating_add(1);
                KeyOutcome::Continue
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll = self.scroll.saturating_sub(1);
                KeyOutcome::Continue
            }
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_add(10);
                KeyOutcome::Continue
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(10);
                KeyOutcome::Continue
            }
            KeyCode::Char('e') => {
                super::export::export_and_show_path(self);
                KeyOutcome::Continue
            }
            KeyCode::Char('y') => {
                super::export::copy_links_and_report(self);
                KeyOutcome::Continue
            }
            _ => KeyOutcome::Continue,
        }
    }
}

pub fn push_wrapped_status_kv(
    out: &mut Vec<Line<'static>>,
    label: &str,
    value: &str,
    status_area_width: u16,
) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    // Account for borders (2 chars on each side)
    let usable_width = status_area_width.saturating_sub(4).max(1);
    let label_text = format!("{label}:");
    let label_width = label_text.chars().count() as u16;

    let value_chars: Vec<char> = value.chars().collect();
    let mut remaining = value_chars.as_slice();
    let mut first = true;

    while !remaining.is_empty() {
        let line_width = if first {
            usable_width.saturating_sub(label_width + 1).max(1)
        } else {
            usable_width.saturating_sub(2).max(1)
        };

        let chars_to_take = (remaining.len() as u16).min(line_width) as usize;
        let (line_chars, rest) = remaining.split_at(chars_to_take);
        let line_text: String = line_chars.iter().collect();

        if first {
            out.push(Line::from(vec![
                Span::styled(label_text.clone(), Style::default().fg(Color::Gray)),
                Span::raw(" "),
                Span::raw(line_text),
            ]));
            first = false;
        } else {
            out.push(Line::from(vec![Span::raw("  "), Span::raw(line_text)]));
        }

        remaining = rest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Candidate;
    use crossterm::event::KeyEvent;
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn loaded(tab: ViewTab) -> UiState {
        let candidate: Candidate = serde_json::from_value(json!({
            "_id": "c1",
            "regno": "22BCE1234",
            "tech": 3,
            "design": 0,
            "techTasks": [{}],
            "designTasks": [{}]
        }))
        .unwrap();
        let mut state = UiState::default();
        state.apply_snapshot(ControllerState {
            query: "22BCE1234".into(),
            candidate: Some(candidate),
            tab,
            ..Default::default()
        });
        state
    }

    #[test]
    fn typing_upper_cases_and_enter_submits() {
        let mut s = UiState::default();
        s.handle_key(key(KeyCode::Char('/')));
        for c in "22bce1234".chars() {
            s.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(s.input, "22BCE1234");
        assert_eq!(s.input_hint(), None);
        match s.handle_key(key(KeyCode::Enter)) {
            KeyOutcome::Send(UiCommand::Search(q)) => assert_eq!(q, "22BCE1234"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(!s.editing);
    }

    #[test]
    fn partial_input_shows_format_hint() {
        let mut s = UiState {
            input: "22B".into(),
            ..Default::default()
        };
        assert_eq!(s.input_hint(), Some(regno::FORMAT_HINT));
        s.input.clear();
        assert_eq!(s.input_hint(), None);
    }

    #[test]
    fn search_is_ignored_while_loading() {
        let mut s = UiState::default();
        s.snapshot.loading = true;
        assert!(matches!(s.handle_key(key(KeyCode::Enter)), KeyOutcome::Continue));
    }

    #[test]
    fn second_promote_waits_for_the_first_to_settle() {
        let mut s = loaded(ViewTab::Responses);
        s.handle_key(key(KeyCode::Right));
        assert_eq!(s.selected_domain, Some(Domain::Design));
        assert!(matches!(
            s.handle_key(key(KeyCode::Char('p'))),
            KeyOutcome::Send(UiCommand::Promote(Domain::Design))
        ));
        assert!(matches!(s.handle_key(key(KeyCode::Char('p'))), KeyOutcome::Continue));
        assert!(matches!(s.handle_key(key(KeyCode::Enter)), KeyOutcome::Continue));

        // Snapshots alone do not release the gate; a stale idle one may still be queued.
        let idle = s.snapshot.clone();
        apply_event(&mut s, ControllerEvent::State(Box::new(idle)));
        assert!(matches!(s.handle_key(key(KeyCode::Char('p'))), KeyOutcome::Continue));

        apply_event(&mut s, ControllerEvent::Settled);
        assert!(matches!(
            s.handle_key(key(KeyCode::Char('p'))),
            KeyOutcome::Send(UiCommand::Promote(Domain::Design))
        ));
    }

    #[test]
    fn new_candidate_builds_view_and_selects_first_domain() {
        let s = loaded(ViewTab::Profile);
        assert!(s.view.is_some());
        assert_eq!(s.selected_domain, Some(Domain::Tech));
        assert_eq!(s.domains(), vec![Domain::Tech, Domain::Design]);
    }

    #[test]
    fn transitions_are_gated_by_level_and_tab() {
        let mut s = loaded(ViewTab::Profile);
        assert!(matches!(s.handle_key(key(KeyCode::Char('x'))), KeyOutcome::Continue));
        assert!(s.info.contains("Application Responses"));

        let mut s = loaded(ViewTab::Responses);
        assert!(matches!(s.handle_key(key(KeyCode::Char('p'))), KeyOutcome::Continue));
        assert_eq!(s.info, "Tech is already at the final round");
        assert!(matches!(
            s.handle_key(key(KeyCode::Char('x'))),
            KeyOutcome::Send(UiCommand::Reject(Domain::Tech))
        ));
        apply_event(&mut s, ControllerEvent::Settled);

        s.handle_key(key(KeyCode::Right));
        assert_eq!(s.selected_domain, Some(Domain::Design));
        assert!(matches!(
            s.handle_key(key(KeyCode::Char('p'))),
            KeyOutcome::Send(UiCommand::Promote(Domain::Design))
        ));
        assert!(matches!(s.handle_key(key(KeyCode::Char('x'))), KeyOutcome::Continue));

        s.handle_key(key(KeyCode::Right));
        assert_eq!(s.selected_domain, Some(Domain::Tech));
    }

    #[test]
    fn tab_asks_controller_for_other_view() {
        let mut s = loaded(ViewTab::Profile);
        assert!(matches!(
            s.handle_key(key(KeyCode::Tab)),
            KeyOutcome::Send(UiCommand::SelectTab(ViewTab::Responses))
        ));
    }

    #[test]
    fn quit_keys() {
        let mut s = UiState::default();
        assert!(matches!(s.handle_key(key(KeyCode::Char('q'))), KeyOutcome::Quit));
        s.editing = true;
        assert!(matches!(s.handle_key(key(KeyCode::Char('q'))), KeyOutcome::Continue));
        assert_eq!(s.input, "Q");
        assert!(matches!(
            s.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyOutcome::Quit
        ));
    }

    #[test]
    fn info_events_replace_status_line() {
        let mut s = UiState::default();
        apply_event(
            &mut s,
            ControllerEvent::Info(InfoEvent::Rejected {
                domain: Domain::Design,
            }),
        );
        assert_eq!(s.info, "Rejected Design (reset to round 0)");
    }

    #[test]
    fn wrapped_kv_splits_long_values() {
        let mut out = Vec::new();
        push_wrapped_status_kv(&mut out, "Email", &"a".repeat(30), 20);
        assert!(out.len() > 1);
        push_wrapped_status_kv(&mut out, "Empty", "   ", 20);
        let before = out.len();
        push_wrapped_status_kv(&mut out, "Empty", "", 20);
        assert_eq!(out.len(), before);
    }
}
