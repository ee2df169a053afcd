use crate::orchestrator::{self, CandidateView};
use anyhow::{Context, Result};
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

use super::state::UiState;

// Global clipboard manager channel - initialized once on first use
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// File name for an exported candidate, unique per fetch.
pub fn export_file_name(view: &CandidateView) -> String {
    format!(
        "candidate-{}-{}.json",
        view.profile.regno,
        view.fetched_at.replace(':', "-").replace('T', "_")
    )
}

/// Export the candidate as JSON into the current directory.
/// Returns the absolute path of the exported file.
pub fn export_candidate_json(view: &CandidateView) -> Result<std::path::PathBuf> {
    let current_dir = std::env::current_dir().context("get current directory")?;
    let path = current_dir.join(export_file_name(view));
    orchestrator::export_json(&path, view)?;
    Ok(path)
}

/// Export the loaded candidate and update state.info with the path.
pub fn export_and_show_path(state: &mut UiState) {
    let Some(view) = state.view.as_ref() else {
        state.info = "No candidate loaded to export".into();
        return;
    };
    match export_candidate_json(view) {
        Ok(path) => {
            state.info = format!("Exported JSON: {}", path.display());
        }
        Err(e) => {
            state.info = format!("JSON export failed: {e:#}");
        }
    }
}

/// Copy every submitted-work link of the loaded candidate, one per line.
pub fn copy_links_and_report(state: &mut UiState) {
    let links: Vec<String> = state
        .view
        .as_ref()
        .and_then(|v| v.responses.as_ref())
        .map(|r| r.submitted_links().into_iter().map(str::to_string).collect())
        .unwrap_or_default();
    if links.is_empty() {
        state.info = "No submitted links to copy".into();
        return;
    }
    match copy_to_clipboard(&links.join("\n")) {
        Ok(()) => {
            state.info = format!("✓ Copied {} link(s) to clipboard", links.len());
        }
        Err(e) => {
            state.info = format!("Clipboard copy failed: {e:#}");
        }
    }
}

/// Initialize the clipboard manager thread if not already initialized.
/// This creates a background thread that processes clipboard operations sequentially,
/// keeping each clipboard instance alive for a sufficient duration.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                // Create a new clipboard instance for each operation
                if let Ok(mut clipboard) = Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        // Clipboard managers on Linux read lazily from the owning instance
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });

        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

/// Copy text to clipboard.
/// Returns immediately after queuing the clipboard operation, without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let sender = init_clipboard_manager()?;
    sender
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Candidate;
    use serde_json::json;

    fn view() -> CandidateView {
        let c: Candidate =
            serde_json::from_value(json!({ "_id": "c1", "regno": "22BCE1234" })).unwrap();
        orchestrator::process_candidate(&c, "22BCE1234")
    }

    #[test]
    fn export_name_is_filesystem_safe() {
        let name = export_file_name(&view());
        assert!(name.starts_with("candidate-22BCE1234-"));
        assert!(name.ends_with(".json"));
        assert!(!name.contains(':'));
    }

    #[test]
    fn nothing_to_do_without_candidate() {
        let mut state = UiState::default();
        export_and_show_path(&mut state);
        assert_eq!(state.info, "No candidate loaded to export");
        copy_links_and_report(&mut state);
        assert_eq!(state.info, "No submitted links to copy");
    }
}
