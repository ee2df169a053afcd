//! Tracing subscriber setup.
//!
//! Non-interactive modes log to stderr. The TUI owns the terminal, so it logs to a file
//! under the user data directory instead.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// `<data dir>/recruit-admin/recruit-admin.log`
pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("recruit-admin").join("recruit-admin.log"))
}

/// `RUST_LOG` wins; otherwise this crate logs at `level` and dependencies at `warn`.
fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("recruit_admin={level},warn").into())
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(target: LogTarget, level: &str) -> Result<()> {
    let registry = tracing_subscriber::registry().with(filter(level));
    let installed = match target {
        LogTarget::Stderr => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogTarget::File(path) => {
            let file = open_log(&path)?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
        }
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}

fn open_log(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}
