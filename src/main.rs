mod api;
mod app;
mod config;
mod display;
mod poller;
mod status;
mod theme;
mod ui;

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use api::{VoteChoice, VoteClient};
use app::{App, Popup};
use config::AppConfig;
use display::DisplayState;
use theme::Theme;

#[derive(Parser, Debug)]
#[command(name = "pawpoll")]
#[command(version)]
#[command(about = "Vote dogs or cats and watch the results live")]
struct Args {
    /// Cast a single vote (dogs or cats), print the results and exit
    #[arg(short, long, value_name = "CHOICE")]
    vote: Option<VoteChoice>,

    /// Print the current results as JSON and exit
    #[arg(short, long)]
    results: bool,

    /// Check backend health and exit
    #[arg(long)]
    health: bool,

    /// Backend base URL, bypasses origin detection
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Origin the client is served from; loopback hosts use the dev backend
    #[arg(long, value_name = "URL")]
    origin: Option<String>,

    /// Poll interval in milliseconds
    #[arg(short, long, value_name = "MS")]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let cli_only = args.vote.is_some() || args.results || args.health;
    init_logging(!cli_only);

    let mut config = AppConfig::load().unwrap_or_default();
    if let Some(ms) = args.interval {
        config.poll_interval_ms = ms;
    }

    // Resolved once; everything downstream gets the same base URL
    let base = config.api_base_url(args.api_url.as_deref(), args.origin.as_deref())?;
    tracing::info!("API endpoint: {}", base);
    let client = VoteClient::new(base, config.request_timeout())?;

    if args.health {
        return print_health(&client).await;
    }

    if let Some(choice) = args.vote {
        return cast_vote(&client, choice, &config).await;
    }

    if args.results {
        return print_results(&client).await;
    }

    ui::init_theme(Theme::from_config(&config.theme));
    run_tui(client, config.poll_interval()).await
}

/// TUI mode logs to a file so output doesn't tear the screen
fn init_logging(to_file: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if !to_file {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
        return;
    }

    match open_log_file() {
        Some(file) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init(),
        None => registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::sink))
            .init(),
    }
}

fn open_log_file() -> Option<std::fs::File> {
    let dir = dirs::cache_dir()?.join("pawpoll");
    std::fs::create_dir_all(&dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("pawpoll.log"))
        .ok()
}

async fn print_health(client: &VoteClient) -> Result<()> {
    let report = client.health().await?;
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

async fn print_results(client: &VoteClient) -> Result<()> {
    let snapshot = client.fetch_results().await?;
    let display = DisplayState::from_snapshot(&snapshot, Local::now());

    println!("{}", serde_json::to_string(&results_json(&display))?);
    Ok(())
}

fn results_json(display: &DisplayState) -> serde_json::Value {
    serde_json::json!({
        "dogs": display.row(VoteChoice::Dogs).count,
        "cats": display.row(VoteChoice::Cats).count,
        "total": display.total,
        "dogs_percent": display.row(VoteChoice::Dogs).percent,
        "cats_percent": display.row(VoteChoice::Cats).percent,
        "updated_at": display.updated_at,
    })
}

async fn cast_vote(client: &VoteClient, choice: VoteChoice, config: &AppConfig) -> Result<()> {
    client.submit_vote(choice).await?;
    tracing::info!("Vote recorded for {}", choice);

    if config.notifications {
        if let Err(e) = notify("pawpoll", &format!("Vote recorded for {}!", choice)) {
            tracing::warn!("Notification failed: {}", e);
        }
    }

    print_results(client).await
}

async fn run_tui(client: VoteClient, poll_interval: Duration) -> Result<()> {
    // Only the UI thread owns the terminal; worker panics become an error status
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if std::thread::current().name() == Some("main") {
            let _ = restore_terminal();
            tracing::error!("Panic: {}", info);
            default_hook(info);
        } else {
            tracing::error!("Panic in background task: {}", info);
        }
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(client);
    app.start_polling(poll_interval).await;

    let result = run_app(&mut terminal, &mut app).await;

    app.stop_polling();
    restore_terminal()?;
    terminal.show_cursor()?;

    result
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.tick();
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        KeyCode::Char('q') if app.popup == Popup::None => return Ok(()),
                        _ => app.handle_key(key),
                    }
                }
            }
        }
    }
}

fn notify(summary: &str, body: &str) -> Result<()> {
    notify_rust::Notification::new()
        .summary(summary)
        .body(body)
        .icon("dialog-information")
        .show()?;
    Ok(())
}
