mod export;
mod help;
mod profile;
mod responses;
mod state;

use crate::cli::{self, Cli};
use crate::engine::PortalClient;
use crate::model::{ControllerEvent, ViewTab};
use crate::orchestrator::{self, CandidateController, UiCommand};
use crate::regno;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Terminal,
};
use state::{apply_event, KeyOutcome, UiState};
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    let session = cli::build_session(&args)?;
    let client =
        PortalClient::new(&cli::build_config(&args)).context("failed to build HTTP client")?;

    // Unbounded channels keep the UI thread from ever blocking on the controller.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<ControllerEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let mut state = UiState {
        operator: session.operator().map(str::to_string),
        authenticated: session.is_authenticated(),
        ..Default::default()
    };
    if let Some(reg_no) = args.reg_no.as_deref().map(regno::normalize) {
        state.input = reg_no.clone();
        state.pending = true;
        let _ = cmd_tx.send(UiCommand::Search(reg_no));
    } else {
        state.editing = true;
    }
    if !state.authenticated {
        state.info = orchestrator::MSG_NOT_LOGGED_IN.into();
    }

    let controller = CandidateController::new(client, session)
        .with_policy(args.failure_policy())
        .with_events(event_tx);

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(state, event_rx, cmd_tx));

    orchestrator::run_controller(controller, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }
    Ok(())
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    mut state: UiState,
    mut event_rx: UnboundedReceiver<ControllerEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let tick_rate = Duration::from_millis(100);
    terminal.draw(|f| draw(f.area(), f, &state)).ok();
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep the UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match state.handle_key(k) {
                    KeyOutcome::Continue => {}
                    KeyOutcome::Send(cmd) => {
                        if cmd_tx.send(cmd).is_err() {
                            break Err(anyhow::anyhow!("controller stopped unexpectedly"));
                        }
                    }
                    KeyOutcome::Quit => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                }
                // Redraw immediately so typing feels responsive.
                terminal.draw(|f| draw(f.area(), f, &state)).ok();
                last_tick = Instant::now();
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    let selected = if state.show_help {
        2
    } else {
        match state.snapshot.tab {
            ViewTab::Profile => 0,
            ViewTab::Responses => 1,
        }
    };
    let title = match state.operator.as_deref() {
        Some(op) => format!("recruit-admin · {op}"),
        None => "recruit-admin".to_string(),
    };
    let tabs = Tabs::new(vec![
        Line::from("Candidate Profile"),
        Line::from("Application Responses"),
        Line::from("Help"),
    ])
    .select(selected)
    .block(Block::default().borders(Borders::ALL).title(title))
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    draw_search(chunks[1], f, state);

    if state.show_help {
        help::draw_help(chunks[2], f);
    } else {
        match state.view.as_ref() {
            Some(view) => match state.snapshot.tab {
                ViewTab::Profile => profile::draw_profile(chunks[2], f, &view.profile, state.scroll),
                ViewTab::Responses => responses::draw_responses(
                    chunks[2],
                    f,
                    view.responses.as_ref(),
                    state.selected_domain,
                    state.busy(),
                    state.scroll,
                ),
            },
            None => draw_placeholder(chunks[2], f, state),
        }
    }

    draw_status(chunks[3], f, state);
}

fn draw_search(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut spans = vec![Span::raw(state.input.clone())];
    if state.editing {
        spans.push(Span::styled(
            "█",
            Style::default().add_modifier(Modifier::SLOW_BLINK),
        ));
    }
    if state.busy() {
        spans.push(Span::styled("  Searching…", Style::default().fg(Color::Gray)));
    }

    let border = if state.editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title("Registration number (/ to edit, enter to search)");
    if let Some(hint) = state.input_hint() {
        block = block.title_bottom(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::Yellow),
        )));
    }
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_placeholder(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let msg = if state.snapshot.loading {
        "Loading candidate…"
    } else if !state.authenticated {
        "Not logged in. Run with --login <email> or set RECRUIT_ADMIN_TOKEN."
    } else {
        "Search for a candidate by registration number."
    };
    let p = Paragraph::new(Line::from(Span::styled(
        msg,
        Style::default().fg(Color::DarkGray),
    )))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(p, area);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let line = match state.snapshot.error.as_deref() {
        Some(err) => Line::from(Span::styled(err.to_string(), Style::default().fg(Color::Red))),
        None => Line::from(Span::styled(
            state.info.clone(),
            Style::default().fg(Color::Gray),
        )),
    };
    f.render_widget(Paragraph::new(line), area);
}
