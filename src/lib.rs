//! Terminal client for the recruitment admin API.
//!
//! Operators search candidates by registration number, review their profile and
//! application responses, and promote or reject them per domain.

pub mod cli;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod regno;
pub mod responses;
pub mod session;
pub mod text_summary;
#[cfg(feature = "tui")]
mod tui;
