// Main entry point - Wiring of the feed session and the terminal dashboard
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use crossterm::event::EventStream;
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::Dashboard;
use crate::application::feed_session::FeedSession;
use crate::infrastructure::config::{load_dashboard_config, LoggingSettings};
use crate::infrastructure::stomp_transport::StompTransport;
use crate::presentation::chart_canvas::ChartCanvas;
use crate::presentation::event_loop::run_dashboard;
use crate::presentation::terminal_view::TerminalView;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Raw mode and the alternate screen, undone on drop.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// The terminal belongs to the UI, so logs go to a file.
fn init_tracing(logging: &LoggingSettings) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logging.file)
        .with_context(|| format!("cannot open log file {}", logging.file))?;
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&logging.level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = load_dashboard_config()?;
    init_tracing(&config.logging)?;
    tracing::info!("Starting wind dashboard for {}", config.feed.endpoint);

    let mut guard = TerminalGuard::enter()?;
    let size = guard.terminal.size()?;

    // Build the view and the dashboard around a shared chart canvas
    let canvas = ChartCanvas::new();
    let view = TerminalView::new(canvas.clone(), config.history.capacity);
    view.sync_layout(Rect::new(0, 0, size.width, size.height));

    let mut dashboard = Dashboard::new(
        &config.feed.server_host(),
        config.window.capacity,
        config.history.capacity,
        canvas,
    );
    if let Err(e) = dashboard.init_chart() {
        drop(guard);
        tracing::error!("Chart initialization failed: {}", e);
        anyhow::bail!("cannot start dashboard: {}", e);
    }

    // Start the feed session in the background
    let (event_tx, event_rx) = mpsc::channel(64);
    let (stop_tx, stop_rx) = watch::channel(false);
    let transport = Arc::new(StompTransport::new(&config.feed));
    let mut session = FeedSession::new(transport, config.feed.session_settings());
    let session_task = tokio::spawn(async move { session.run(event_tx, stop_rx).await });

    let result = run_dashboard(
        &mut guard.terminal,
        &view,
        &mut dashboard,
        event_rx,
        EventStream::new(),
    )
    .await;

    let _ = stop_tx.send(true);
    let session_result = match tokio::time::timeout(SHUTDOWN_GRACE, session_task).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            tracing::error!("Feed session task failed: {}", e);
            Err(anyhow::anyhow!("feed session failed: {}", e))
        }
        Err(_) => {
            tracing::warn!("Feed session did not stop within {:?}", SHUTDOWN_GRACE);
            Ok(())
        }
    };

    drop(guard);
    tracing::info!("Dashboard closed");
    result.and(session_result)
}
