//! LeadRanker TUI - A terminal client for the LeadRanker lead-scoring service.
//!
//! This application provides a fast, keyboard-driven interface for scoring
//! inbound leads, browsing lead history and managing the account's plan.

mod app;
mod form;
mod ui;

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use leadranker_core::{ApiClient, Config, Route, Session};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE: &str = "leadranker.log";

const USAGE: &str = "\
Usage: leadranker [COMMAND]

Commands:
  (none)        Start the terminal client
  open <URL>    Start at a link, e.g. a password-reset or Google sign-in link
  login         Sign in from the command line
  logout        Forget the stored session
  whoami        Show the signed-in account

Environment:
  LEADRANKER_API_URL        Backend base URL
  LEADRANKER_TOKEN_BACKEND  Where the session is kept: keyring or file
  RUST_LOG                  Log filter (default: warn)";

/// Initialize the tracing subscriber for logging.
///
/// The terminal belongs to the UI, so logs go to a file in the data
/// directory. The returned guard flushes the writer on drop.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = config
        .data_dir()
        .and_then(|dir| std::fs::create_dir_all(&dir).map(|_| dir).map_err(Into::into));

    match log_dir {
        Ok(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

fn build_session(config: &Config) -> Result<Session> {
    let store = Arc::new(config.token_store()?);
    let api = ApiClient::from_config(config, store).context("Failed to build HTTP client")?;
    Ok(Session::new(api))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;
    let _log_guard = init_tracing(&config);

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        None => run_tui(config, None).await,
        Some("open") => {
            let location = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("open needs a link\n\n{}", USAGE))?;
            run_tui(config, Some(location.clone())).await
        }
        Some("login") => login_command(config).await,
        Some("logout") => logout_command(&config),
        Some("whoami") => whoami_command(&config).await,
        Some("-h") | Some("--help") | Some("help") => {
            println!("{}", USAGE);
            Ok(())
        }
        Some(other) => anyhow::bail!("Unknown command: {}\n\n{}", other, USAGE),
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn login_command(mut config: Config) -> Result<()> {
    let session = build_session(&config)?;

    let default_email = config.last_email.clone().unwrap_or_default();
    if default_email.is_empty() {
        print!("Email: ");
    } else {
        print!("Email [{}]: ", default_email);
    }
    io::stdout().flush()?;

    let mut email = String::new();
    io::stdin().lock().read_line(&mut email)?;
    let email = match email.trim() {
        "" => default_email,
        typed => typed.to_string(),
    };

    let password = rpassword::prompt_password("Password: ")?;
    let credential = session
        .login(&email, &password)
        .await
        .map_err(|e| anyhow::anyhow!(e.message()))?;

    println!("Signed in as {}", credential.display_name());
    if credential.email.is_some() && config.last_email != credential.email {
        config.last_email = credential.email;
        config.save()?;
    }
    Ok(())
}

fn logout_command(config: &Config) -> Result<()> {
    let session = build_session(config)?;
    session.logout()?;
    println!("Signed out");
    Ok(())
}

async fn whoami_command(config: &Config) -> Result<()> {
    let session = build_session(config)?;
    if session.current().is_none() {
        anyhow::bail!("Not signed in. Run `leadranker login` first.");
    }
    let account = session
        .whoami()
        .await
        .map_err(|e| anyhow::anyhow!(e.message()))?;
    println!("{}", account.display_email().unwrap_or("(no email on account)"));
    Ok(())
}

// ============================================================================
// Terminal UI
// ============================================================================

async fn run_tui(config: Config, location: Option<String>) -> Result<()> {
    info!("LeadRanker TUI starting");

    let session = build_session(&config)?;
    let mut app = App::new(config, session);
    app.start(Route::Dashboard);
    if let Some(ref location) = location {
        app.open_location(location);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("LeadRanker TUI shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks().await;

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
