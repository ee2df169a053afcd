use crate::engine::{PortalApi, PortalClient};
use crate::logging::{self, LogTarget};
use crate::model::{ClientConfig, ControllerEvent, Domain, LoginRequest};
use crate::orchestrator::{
    self, CandidateController, CandidateView, SearchOutcome, TransitionFailurePolicy,
    TransitionReport,
};
use crate::regno;
use crate::session::{CredentialStore, Session};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "recruit-admin",
    version,
    about = "Review recruitment candidates and advance their interview rounds"
)]
pub struct Cli {
    /// Registration number to look up (e.g. 22BCE1234)
    pub reg_no: Option<String>,

    /// Base URL of the recruitment API
    #[arg(long, env = "RECRUIT_ADMIN_BASE_URL", default_value = "http://localhost:5001")]
    pub base_url: String,

    /// Bearer token; takes precedence over stored credentials
    #[arg(long, env = "RECRUIT_ADMIN_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Path to the credentials file
    #[arg(long)]
    pub credentials: Option<PathBuf>,

    /// Log in with this email, store the token and exit
    #[arg(long, value_name = "EMAIL", conflicts_with = "logout")]
    pub login: Option<String>,

    /// Password for --login
    #[arg(long, env = "RECRUIT_ADMIN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Remove stored credentials and exit
    #[arg(long)]
    pub logout: bool,

    /// Print the candidate as JSON and exit (no TUI)
    #[arg(long, conflicts_with = "text")]
    pub json: bool,

    /// Print a text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Promote the candidate one round in DOMAIN (tech, design, management)
    #[arg(long, value_name = "DOMAIN", conflicts_with = "reject")]
    pub promote: Option<Domain>,

    /// Reset the candidate to round 0 in DOMAIN
    #[arg(long, value_name = "DOMAIN")]
    pub reject: Option<Domain>,

    /// Report failed round updates instead of only logging them
    #[arg(long)]
    pub surface_transition_errors: bool,

    /// Request timeout
    #[arg(long, default_value = "10s")]
    pub timeout: humantime::Duration,

    /// Export the fetched candidate as JSON (implies a non-interactive lookup)
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Log level for this crate when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Whether this invocation runs the interactive dashboard.
    pub fn is_interactive(&self) -> bool {
        !self.json
            && !self.text
            && self.promote.is_none()
            && self.reject.is_none()
            && self.export_json.is_none()
            && self.login.is_none()
            && !self.logout
    }

    pub fn failure_policy(&self) -> TransitionFailurePolicy {
        if self.surface_transition_errors {
            TransitionFailurePolicy::Surface
        } else {
            TransitionFailurePolicy::LogOnly
        }
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let target = if args.is_interactive() && cfg!(feature = "tui") {
        LogTarget::File(
            logging::default_log_path()
                .unwrap_or_else(|| std::env::temp_dir().join("recruit-admin.log")),
        )
    } else {
        LogTarget::Stderr
    };
    logging::init(target, &args.log_level)?;

    if args.logout {
        return run_logout(&args);
    }
    if let Some(email) = args.login.clone() {
        return run_login(&args, email).await;
    }

    if args.is_interactive() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_text(args).await;
        }
    }

    if args.json {
        return run_json(args).await;
    }

    run_text(args).await
}

/// Build a `ClientConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> ClientConfig {
    ClientConfig {
        base_url: args.base_url.trim_end_matches('/').to_string(),
        timeout: Duration::from(args.timeout),
        user_agent: format!("recruit-admin/{}", env!("CARGO_PKG_VERSION")),
    }
}

pub fn credential_store(args: &Cli) -> Result<CredentialStore> {
    let path = match args.credentials.clone() {
        Some(path) => path,
        None => CredentialStore::default_path()?,
    };
    Ok(CredentialStore::new(path))
}

/// Load the session once at startup. A `--token` works even without a config dir.
pub fn build_session(args: &Cli) -> Result<Session> {
    let mut session = match credential_store(args) {
        Ok(store) => Session::new(store),
        Err(e) if args.token.is_some() => {
            tracing::debug!("no credential store: {e:#}");
            Session::default()
        }
        Err(e) => return Err(e),
    };
    session = session.with_token_override(args.token.clone());
    session
        .refresh()
        .context("failed to read stored credentials")?;
    Ok(session)
}

async fn run_login(args: &Cli, email: String) -> Result<()> {
    let password = args
        .password
        .clone()
        .context("--password or RECRUIT_ADMIN_PASSWORD is required with --login")?;
    let client = PortalClient::new(&build_config(args)).context("failed to build HTTP client")?;
    let response = client
        .login(&LoginRequest { email, password })
        .await
        .context("login failed")?;

    let store = credential_store(args)?;
    let path = store.path().to_path_buf();
    let mut session = Session::new(store);
    session
        .record_login(&response)
        .context("failed to save credentials")?;

    println!(
        "Logged in as {}. Credentials saved to {}",
        session.operator().unwrap_or("operator"),
        path.display()
    );
    Ok(())
}

fn run_logout(args: &Cli) -> Result<()> {
    let store = credential_store(args)?;
    let path = store.path().to_path_buf();
    let mut session = Session::new(store);
    if session.logout().context("failed to remove credentials")? {
        println!("Logged out. Removed {}", path.display());
    } else {
        println!("No stored credentials at {}", path.display());
    }
    Ok(())
}

/// Search, apply the requested transition if any, and shape the result.
async fn lookup(args: &Cli, out_tx: &mpsc::UnboundedSender<OutputLine>) -> Result<CandidateView> {
    let reg_no = args
        .reg_no
        .as_deref()
        .map(regno::normalize)
        .context("a registration number is required outside the TUI")?;

    let session = build_session(args)?;
    let client = PortalClient::new(&build_config(args)).context("failed to build HTTP client")?;
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<ControllerEvent>();
    let mut controller = CandidateController::new(client, session)
        .with_policy(args.failure_policy())
        .with_events(evt_tx);

    if controller.search(&reg_no).await != SearchOutcome::Found {
        anyhow::bail!(controller
            .state()
            .error
            .clone()
            .unwrap_or_else(|| orchestrator::MSG_FETCH_FAILED.to_string()));
    }

    let report = match (args.promote, args.reject) {
        (Some(domain), _) => Some(controller.promote(domain).await),
        (None, Some(domain)) => Some(controller.reject(domain).await),
        (None, None) => None,
    };

    while let Ok(ev) = evt_rx.try_recv() {
        if let ControllerEvent::Info(info) = ev {
            let _ = out_tx.send(OutputLine::Stderr(info.to_message()));
        }
    }
    if let Some(err) = controller.state().error.as_deref() {
        let _ = out_tx.send(OutputLine::Stderr(err.to_string()));
    }
    if report == Some(TransitionReport::Failed)
        && args.failure_policy() == TransitionFailurePolicy::Surface
    {
        anyhow::bail!(orchestrator::MSG_UPDATE_FAILED);
    }

    let candidate = controller
        .candidate()
        .context("candidate disappeared after update")?;
    let view = orchestrator::process_candidate(candidate, &reg_no);
    if let Some(path) = args.export_json.as_deref() {
        orchestrator::export_json(path, &view)?;
        let _ = out_tx.send(OutputLine::Stderr(format!("Exported JSON: {}", path.display())));
    }
    Ok(view)
}

async fn run_json(args: Cli) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();
    let result = lookup(&args, &out_tx).await;
    if let Ok(view) = result.as_ref() {
        let out = serde_json::to_string_pretty(view)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    }
    drop(out_tx);
    let _ = out_handle.await;
    result.map(|_| ())
}

async fn run_text(args: Cli) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();
    let result = lookup(&args, &out_tx).await;
    if let Ok(view) = result.as_ref() {
        let summary = crate::text_summary::build_text_summary(view);
        for line in summary.lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }
    drop(out_tx);
    let _ = out_handle.await;
    result.map(|_| ())
}
