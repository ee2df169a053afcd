//! Candidate session controller.
//!
//! Owns search and round-transition orchestration and publishes state snapshots for
//! presentation layers. Every remote call is awaited before the next step; a transition
//! that reached the server is always followed by a re-fetch of the candidate.

use crate::engine::{self, PortalApi, TransitionOutcome};
use crate::model::{
    Candidate, ControllerEvent, ControllerState, Domain, InfoEvent, Transition, ViewTab,
};
use crate::regno;
use crate::session::Session;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

pub const MSG_BLANK_QUERY: &str = "Please enter a registration number";
pub const MSG_NOT_LOGGED_IN: &str =
    "You are not logged in. Run with --login or set RECRUIT_ADMIN_TOKEN.";
pub const MSG_NOT_FOUND: &str = "No candidate found with this registration number";
pub const MSG_FETCH_FAILED: &str = "Failed to fetch candidate data. Please try again.";
pub const MSG_UPDATE_FAILED: &str = "Failed to update round status. Please try again.";

/// What the operator sees when a round update fails on the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionFailurePolicy {
    /// Log the failure and carry on.
    #[default]
    LogOnly,
    /// Also put an error message in front of the operator.
    Surface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Found,
    NotFound,
    /// Blank or malformed input; nothing was sent.
    Invalid,
    Unauthenticated,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionReport {
    NoCandidate,
    Unauthenticated,
    Blocked,
    Submitted,
    Failed,
}

/// Commands emitted by UI layers.
#[cfg_attr(not(feature = "tui"), allow(dead_code))]
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Search(String),
    Promote(Domain),
    Reject(Domain),
    SelectTab(ViewTab),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    /// Operator-initiated: failures clear the displayed candidate.
    Search,
    /// Read-after-write: failures keep the stale candidate.
    Resync,
}

pub struct CandidateController<A> {
    api: A,
    session: Session,
    policy: TransitionFailurePolicy,
    state: ControllerState,
    /// Last query that passed validation; re-fetches after a transition use it.
    last_searched: String,
    events: Option<UnboundedSender<ControllerEvent>>,
}

impl<A: PortalApi> CandidateController<A> {
    pub fn new(api: A, session: Session) -> Self {
        Self {
            api,
            session,
            policy: TransitionFailurePolicy::default(),
            state: ControllerState::default(),
            last_searched: String::new(),
            events: None,
        }
    }

    pub fn with_policy(mut self, policy: TransitionFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_events(mut self, events: UnboundedSender<ControllerEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        self.state.candidate.as_ref()
    }

    pub fn select_tab(&mut self, tab: ViewTab) {
        self.state.tab = tab;
        self.publish();
    }

    pub fn toggle_tab(&mut self) {
        self.select_tab(self.state.tab.toggled());
    }

    /// Look up `reg_no` and replace the held candidate with the result.
    pub async fn search(&mut self, reg_no: &str) -> SearchOutcome {
        self.state.query = reg_no.to_string();

        if reg_no.trim().is_empty() {
            return self.block_input(MSG_BLANK_QUERY.to_string());
        }
        if !regno::is_valid(reg_no) {
            return self.block_input(format!(
                "Invalid registration number. {}",
                regno::FORMAT_HINT
            ));
        }

        self.last_searched = reg_no.to_string();
        self.fetch(reg_no.to_string(), FetchMode::Search).await
    }

    pub async fn promote(&mut self, domain: Domain) -> TransitionReport {
        self.transition(domain, Transition::Promote).await
    }

    pub async fn reject(&mut self, domain: Domain) -> TransitionReport {
        self.transition(domain, Transition::Reject).await
    }

    fn block_input(&mut self, message: String) -> SearchOutcome {
        debug!(query = %self.state.query, "search blocked: {message}");
        self.state.error = Some(message);
        self.publish();
        SearchOutcome::Invalid
    }

    async fn fetch(&mut self, reg_no: String, mode: FetchMode) -> SearchOutcome {
        let Some(token) = self.session.token().map(str::to_owned) else {
            warn!(reg_no = %reg_no, "search aborted: no stored token");
            self.state.error = Some(MSG_NOT_LOGGED_IN.to_string());
            self.publish();
            return SearchOutcome::Unauthenticated;
        };

        self.state.loading = true;
        self.state.error = None;
        self.publish();

        let result = self.api.search(&token, &reg_no).await;
        self.state.loading = false;

        let outcome = match result {
            Ok(envelope) => match envelope.into_first() {
                Some(candidate) => {
                    info!(reg_no = %reg_no, candidate = %candidate.id, ?mode, "candidate loaded");
                    self.state.candidate = Some(candidate);
                    SearchOutcome::Found
                }
                None => {
                    info!(reg_no = %reg_no, "no candidate found");
                    self.state.error = Some(MSG_NOT_FOUND.to_string());
                    SearchOutcome::NotFound
                }
            },
            Err(e) => {
                warn!(reg_no = %reg_no, ?mode, transient = e.is_transient(), "candidate fetch failed: {e}");
                self.state.error = Some(MSG_FETCH_FAILED.to_string());
                SearchOutcome::Failed
            }
        };

        if outcome != SearchOutcome::Found && mode == FetchMode::Search {
            self.state.candidate = None;
        }
        self.publish();
        outcome
    }

    async fn transition(&mut self, domain: Domain, transition: Transition) -> TransitionReport {
        let Some(candidate) = self.state.candidate.clone() else {
            debug!(%domain, ?transition, "no candidate loaded");
            return TransitionReport::NoCandidate;
        };

        let Some(token) = self.session.token().map(str::to_owned) else {
            warn!(%domain, ?transition, "transition aborted: no stored token");
            if self.policy == TransitionFailurePolicy::Surface {
                self.state.error = Some(MSG_NOT_LOGGED_IN.to_string());
                self.publish();
            }
            return TransitionReport::Unauthenticated;
        };

        if engine::plan_transition(candidate.levels(), domain, transition).is_err() {
            self.notify(InfoEvent::TransitionSkipped { domain, transition });
            return TransitionReport::Blocked;
        }

        self.state.loading = true;
        self.publish();
        let outcome =
            engine::submit_transition(&self.api, &token, &candidate, domain, transition).await;
        self.state.loading = false;

        if !outcome.was_sent() {
            self.publish();
            return TransitionReport::Blocked;
        }
        let report = match &outcome {
            TransitionOutcome::Submitted { levels } => {
                self.notify(match transition {
                    Transition::Promote => InfoEvent::Promoted {
                        domain,
                        level: levels.get(domain),
                    },
                    Transition::Reject => InfoEvent::Rejected { domain },
                });
                TransitionReport::Submitted
            }
            TransitionOutcome::Failed { .. } | TransitionOutcome::Blocked(_) => {
                TransitionReport::Failed
            }
        };

        // Re-read the source of truth whether or not the write succeeded.
        let reg_no = if self.last_searched.is_empty() {
            candidate.regno.clone().unwrap_or_default()
        } else {
            self.last_searched.clone()
        };
        self.fetch(reg_no, FetchMode::Resync).await;

        if report == TransitionReport::Failed && self.policy == TransitionFailurePolicy::Surface {
            self.state.error = Some(MSG_UPDATE_FAILED.to_string());
            self.notify(InfoEvent::TransitionFailed { domain });
            self.publish();
        }
        report
    }

    fn publish(&self) {
        if let Some(tx) = &self.events {
            let _ = tx.send(ControllerEvent::State(Box::new(self.state.clone())));
        }
    }

    fn settle(&self) {
        if let Some(tx) = &self.events {
            let _ = tx.send(ControllerEvent::Settled);
        }
    }

    fn notify(&self, info: InfoEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(ControllerEvent::Info(info));
        }
    }
}

/// Drive a controller from UI commands until `Quit` or the channel closes.
///
/// Commands are handled one at a time; a command arriving while another is in flight
/// waits for it to finish. Each search and round command ends with `Settled`.
#[cfg_attr(not(feature = "tui"), allow(dead_code))]
pub(crate) async fn run_controller<A: PortalApi>(
    mut controller: CandidateController<A>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) {
    controller.publish();
    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            UiCommand::Search(reg_no) => {
                controller.search(&reg_no).await;
                controller.settle();
            }
            UiCommand::Promote(domain) => {
                controller.promote(domain).await;
                controller.settle();
            }
            UiCommand::Reject(domain) => {
                controller.reject(domain).await;
                controller.settle();
            }
            UiCommand::SelectTab(tab) => controller.select_tab(tab),
            UiCommand::Quit => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::{candidate, FakePortal};
    use crate::model::{RoundLevel, RoundLevels};
    use std::sync::Arc;

    fn levels(t: u8, d: u8, m: u8) -> RoundLevels {
        RoundLevels {
            tech: RoundLevel::new(t).unwrap(),
            design: RoundLevel::new(d).unwrap(),
            management: RoundLevel::new(m).unwrap(),
        }
    }

    fn portal(records: Vec<Candidate>) -> Arc<FakePortal> {
        Arc::new(FakePortal::with(records))
    }

    fn controller(api: &Arc<FakePortal>) -> CandidateController<Arc<FakePortal>> {
        CandidateController::new(Arc::clone(api), Session::from_token("tok"))
    }

    #[tokio::test]
    async fn blank_query_is_blocked_without_network() {
        let api = portal(vec![]);
        let mut c = controller(&api);
        assert_eq!(c.search("   ").await, SearchOutcome::Invalid);
        assert_eq!(c.state().error.as_deref(), Some(MSG_BLANK_QUERY));
        assert!(api.searches().is_empty());
    }

    #[tokio::test]
    async fn malformed_query_is_blocked_without_network() {
        let api = portal(vec![]);
        let mut c = controller(&api);
        assert_eq!(c.search("22bce1234").await, SearchOutcome::Invalid);
        assert!(c.state().error.as_deref().unwrap().contains(regno::FORMAT_HINT));
        assert!(api.searches().is_empty());
    }

    #[tokio::test]
    async fn missing_token_has_its_own_message() {
        let api = portal(vec![candidate("c1", "22BCE1234", levels(0, 0, 0))]);
        let mut c = CandidateController::new(Arc::clone(&api), Session::default());
        assert_eq!(c.search("22BCE1234").await, SearchOutcome::Unauthenticated);
        assert_eq!(c.state().error.as_deref(), Some(MSG_NOT_LOGGED_IN));
        assert_ne!(MSG_NOT_LOGGED_IN, MSG_NOT_FOUND);
        assert!(api.searches().is_empty());
    }

    #[tokio::test]
    async fn not_found_then_found_overwrites_cleanly() {
        let api = portal(vec![candidate("c1", "22BCE1234", levels(1, 0, 0))]);
        let mut c = controller(&api);

        assert_eq!(c.search("23MEE0001").await, SearchOutcome::NotFound);
        assert_eq!(c.state().error.as_deref(), Some(MSG_NOT_FOUND));
        assert!(c.candidate().is_none());

        assert_eq!(c.search("22BCE1234").await, SearchOutcome::Found);
        assert_eq!(c.state().error, None);
        assert_eq!(c.candidate().unwrap().id, "c1");
        assert!(!c.state().loading);
        assert_eq!(api.searches()[1], ("tok".to_string(), "22BCE1234".to_string()));
    }

    #[tokio::test]
    async fn failed_search_clears_previous_candidate() {
        let api = portal(vec![candidate("c1", "22BCE1234", levels(0, 0, 0))]);
        let mut c = controller(&api);
        c.search("22BCE1234").await;
        assert!(c.candidate().is_some());

        api.fail_search(true);
        assert_eq!(c.search("22BCE1234").await, SearchOutcome::Failed);
        assert_eq!(c.state().error.as_deref(), Some(MSG_FETCH_FAILED));
        assert!(c.candidate().is_none());
        assert!(!c.state().loading);
    }

    #[tokio::test]
    async fn unsuccessful_envelope_is_not_found() {
        let api = portal(vec![candidate("c1", "22BCE1234", levels(0, 0, 0))]);
        api.unsuccessful(true);
        let mut c = controller(&api);
        assert_eq!(c.search("22BCE1234").await, SearchOutcome::NotFound);
        assert!(c.candidate().is_none());
    }

    #[tokio::test]
    async fn promote_at_final_round_submits_nothing() {
        let api = portal(vec![candidate("c1", "22BCE1234", levels(3, 1, 0))]);
        let mut c = controller(&api);
        c.search("22BCE1234").await;

        assert_eq!(c.promote(Domain::Tech).await, TransitionReport::Blocked);
        assert!(api.updates().is_empty());
        assert_eq!(api.searches().len(), 1);
        assert_eq!(c.candidate().unwrap().levels(), levels(3, 1, 0));
    }

    #[tokio::test]
    async fn promote_submits_full_triple_then_refetches() {
        let api = portal(vec![candidate("c1", "22BCE1234", levels(2, 1, 3))]);
        let mut c = controller(&api);
        c.search("22BCE1234").await;

        assert_eq!(c.promote(Domain::Tech).await, TransitionReport::Submitted);
        let updates = api.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(
            (updates[0].1.tech, updates[0].1.design, updates[0].1.management),
            (3, 1, 3)
        );
        assert_eq!(api.searches().len(), 2);
        assert_eq!(c.candidate().unwrap().levels(), levels(3, 1, 3));
    }

    #[tokio::test]
    async fn reject_resets_only_the_target_domain() {
        let api = portal(vec![candidate("c1", "22BCE1234", levels(1, 2, 0))]);
        let mut c = controller(&api);
        c.search("22BCE1234").await;

        assert_eq!(c.reject(Domain::Management).await, TransitionReport::Blocked);
        assert!(api.updates().is_empty());

        assert_eq!(c.reject(Domain::Design).await, TransitionReport::Submitted);
        assert_eq!(c.candidate().unwrap().levels(), levels(1, 0, 0));
    }

    #[tokio::test]
    async fn failed_update_is_logged_only_by_default_and_still_refetches() {
        let api = portal(vec![candidate("c1", "22BCE1234", levels(0, 0, 0))]);
        let mut c = controller(&api);
        c.search("22BCE1234").await;
        api.fail_updates(true);

        assert_eq!(c.promote(Domain::Design).await, TransitionReport::Failed);
        assert_eq!(c.state().error, None);
        assert_eq!(api.searches().len(), 2);
        assert_eq!(c.candidate().unwrap().levels(), levels(0, 0, 0));
    }

    #[tokio::test]
    async fn failed_update_can_be_surfaced() {
        let api = portal(vec![candidate("c1", "22BCE1234", levels(0, 0, 0))]);
        let mut c = controller(&api).with_policy(TransitionFailurePolicy::Surface);
        c.search("22BCE1234").await;
        api.fail_updates(true);

        assert_eq!(c.promote(Domain::Design).await, TransitionReport::Failed);
        assert_eq!(c.state().error.as_deref(), Some(MSG_UPDATE_FAILED));
    }

    #[tokio::test]
    async fn failed_resync_keeps_stale_candidate() {
        let api = portal(vec![candidate("c1", "22BCE1234", levels(0, 0, 0))]);
        let mut c = controller(&api);
        c.search("22BCE1234").await;
        api.fail_search(true);

        assert_eq!(c.promote(Domain::Tech).await, TransitionReport::Submitted);
        assert_eq!(c.state().error.as_deref(), Some(MSG_FETCH_FAILED));
        assert_eq!(c.candidate().unwrap().levels(), levels(0, 0, 0));
    }

    #[tokio::test]
    async fn transition_without_token_never_reaches_network() {
        let api = portal(vec![]);
        let mut c = CandidateController::new(Arc::clone(&api), Session::default());
        c.state.candidate = Some(candidate("c1", "22BCE1234", levels(1, 1, 1)));

        assert_eq!(c.promote(Domain::Tech).await, TransitionReport::Unauthenticated);
        assert!(api.updates().is_empty());
        assert!(api.searches().is_empty());
    }

    #[tokio::test]
    async fn transition_without_candidate_is_noop() {
        let api = portal(vec![]);
        let mut c = controller(&api);
        assert_eq!(c.reject(Domain::Tech).await, TransitionReport::NoCandidate);
        assert!(api.updates().is_empty());
    }

    #[tokio::test]
    async fn loading_is_published_around_the_request() {
        let api = portal(vec![candidate("c1", "22BCE1234", levels(0, 0, 0))]);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut c = controller(&api).with_events(tx);
        c.search("22BCE1234").await;

        let mut loading_flags = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if let ControllerEvent::State(s) = ev {
                loading_flags.push(s.loading);
            }
        }
        assert_eq!(loading_flags, vec![true, false]);
    }

    #[tokio::test]
    async fn tabs_are_mutually_exclusive() {
        let api = portal(vec![]);
        let mut c = controller(&api);
        assert_eq!(c.state().tab, ViewTab::Profile);
        c.toggle_tab();
        assert_eq!(c.state().tab, ViewTab::Responses);
        c.select_tab(ViewTab::Profile);
        assert_eq!(c.state().tab, ViewTab::Profile);
    }

    #[tokio::test]
    async fn run_controller_processes_commands_in_order() {
        let api = portal(vec![candidate("c1", "22BCE1234", levels(0, 2, 0))]);
        let (evt_tx, mut evt_rx) = tokio::sync::mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = tokio::sync::mpsc::unbounded_channel();
        let c = controller(&api).with_events(evt_tx);

        cmd_tx.send(UiCommand::Search("22BCE1234".into())).unwrap();
        cmd_tx.send(UiCommand::Promote(Domain::Design)).unwrap();
        cmd_tx.send(UiCommand::SelectTab(ViewTab::Responses)).unwrap();
        cmd_tx.send(UiCommand::Quit).unwrap();
        run_controller(c, cmd_rx).await;

        assert_eq!(api.updates().len(), 1);
        assert_eq!(api.updates()[0].1.design, 3);

        let mut last = None;
        let mut promoted = false;
        while let Ok(ev) = evt_rx.try_recv() {
            match ev {
                ControllerEvent::State(s) => last = Some(s),
                ControllerEvent::Info(InfoEvent::Promoted { domain, level }) => {
                    promoted = domain == Domain::Design && level == RoundLevel::MAX;
                }
                ControllerEvent::Info(_) | ControllerEvent::Settled => {}
            }
        }
        let last = last.unwrap();
        assert!(promoted);
        assert_eq!(last.tab, ViewTab::Responses);
        assert_eq!(last.candidate.unwrap().design, RoundLevel::MAX);
    }

    #[tokio::test]
    async fn every_round_command_is_followed_by_settled() {
        let api = portal(vec![candidate("c1", "22BCE1234", levels(3, 0, 0))]);
        let (evt_tx, mut evt_rx) = tokio::sync::mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = tokio::sync::mpsc::unbounded_channel();
        let c = controller(&api).with_events(evt_tx);

        cmd_tx.send(UiCommand::Search("22BCE1234".into())).unwrap();
        cmd_tx.send(UiCommand::Promote(Domain::Tech)).unwrap();
        cmd_tx.send(UiCommand::SelectTab(ViewTab::Responses)).unwrap();
        cmd_tx.send(UiCommand::Reject(Domain::Tech)).unwrap();
        cmd_tx.send(UiCommand::Quit).unwrap();
        run_controller(c, cmd_rx).await;

        let mut settled = 0;
        let mut last_state_loading = None;
        while let Ok(ev) = evt_rx.try_recv() {
            match ev {
                ControllerEvent::Settled => {
                    settled += 1;
                    assert_eq!(last_state_loading, Some(false));
                }
                ControllerEvent::State(s) => last_state_loading = Some(s.loading),
                ControllerEvent::Info(_) => {}
            }
        }
        // The blocked promote still settles; tab selection does not.
        assert_eq!(settled, 3);
        assert_eq!(api.updates().len(), 1);
    }
}
