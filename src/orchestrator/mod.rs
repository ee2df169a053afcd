//! Application-level orchestration.
//!
//! This module owns the candidate session (search, round transitions, re-fetch) and
//! post-fetch processing such as profile shaping and exports. UI/CLI layers call into
//! this module to keep responsibilities separated.

mod controller;
mod post_process;

pub use controller::{
    CandidateController, SearchOutcome, TransitionFailurePolicy, TransitionReport,
    MSG_BLANK_QUERY, MSG_FETCH_FAILED, MSG_NOT_FOUND, MSG_NOT_LOGGED_IN, MSG_UPDATE_FAILED,
};
#[cfg(feature = "tui")]
pub(crate) use controller::{run_controller, UiCommand};
pub use post_process::{
    event_tags, export_json, process_candidate, shape_profile, CandidateView, ProfileView,
    NOT_PROVIDED, UNNAMED_CANDIDATE,
};
