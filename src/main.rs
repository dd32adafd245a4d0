mod action;
mod api;
mod app;
mod auth;
mod config;
mod error;
mod event;
mod listing;
mod source;
mod tui;
mod types;
mod ui;
mod viewport;

use std::fs::OpenOptions;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::api::{ApiClient, BranchesEndpoint, TestsEndpoint};
use crate::app::App;
use crate::config::Config;
use crate::event::Event;
use crate::source::PageSource;
use crate::tui::EventHandler;

/// Browse the lab test catalogue and branch pricing
#[derive(Debug, Parser)]
#[command(name = "labdesk", version)]
struct Cli {
    /// Config file (defaults to <config dir>/labdesk/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// API base URL, overrides [api] base_url
    #[arg(long)]
    base_url: Option<String>,

    /// Page size for every list
    #[arg(long)]
    page_size: Option<u32>,

    /// Write logs here instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging(cli.log_file.as_deref())?;

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let mut config = Config::load(cli.config.as_deref());
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }
    if let Some(page_size) = cli.page_size.filter(|&n| n > 0) {
        config.tests.page_size = page_size;
        config.branches.page_size = page_size;
    }
    config.api.validate()?;

    let token = auth::load_token(&config.api);
    let api = Arc::new(ApiClient::new(&config.api, token)?);
    let tests: Arc<dyn PageSource> = Arc::new(TestsEndpoint::new(Arc::clone(&api)));
    let branches: Arc<dyn PageSource> = Arc::new(BranchesEndpoint::new(api));

    // Run the application
    let result = run(&config, tests, branches).await;

    // Restore terminal
    tui::restore()?;

    result
}

fn init_logging(log_file: Option<&Path>) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
    Ok(())
}

async fn run(
    config: &Config,
    tests: Arc<dyn PageSource>,
    branches: Arc<dyn PageSource>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (_, height) = crossterm::terminal::size()?;

    // Initialize terminal
    let mut terminal = tui::init()?;

    // Create action channel
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    // Create app state
    let mut app = App::new(config, tests, branches, height, action_tx.clone());

    // Create event handler
    let tick_rate = Duration::from_millis(250);
    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = EventHandler::new(tick_rate, render_rate);

    // Main loop
    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
