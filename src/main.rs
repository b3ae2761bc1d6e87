//! Headlines - Browse top news headlines in the terminal
//!
//! A terminal UI application that pages through top headlines, caches the
//! first page, and falls back to the cached copy when the network is down.

use std::io;
use std::panic;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, warn};
use ratatui::{backend::CrosstermBackend, Terminal};

use headlines::app::{App, AppState};
use headlines::cache::TtlCache;
use headlines::cli::{Cli, StartupConfig};
use headlines::data::NewsClient;
use headlines::{logging, ui};

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Renders the UI based on the current application state
fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    match &app.state {
        AppState::Loading => {
            render_loading(frame);
        }
        AppState::ArticleList => {
            ui::render_article_list(frame, app);
        }
        AppState::ArticleDetail(index) => {
            ui::render_article_detail(frame, app, *index);
        }
    }

    if app.show_help {
        ui::render_help_overlay(frame);
    }
}

/// Renders a loading message while the first page is fetched
fn render_loading(frame: &mut ratatui::Frame) {
    use ratatui::{
        layout::{Alignment, Constraint, Direction, Layout},
        style::{Color, Style},
        widgets::Paragraph,
    };

    let area = frame.area();

    // Center the loading message vertically
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Percentage(45),
        ])
        .split(area);

    let loading_text = Paragraph::new("Loading headlines...")
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);

    frame.render_widget(loading_text, chunks[1]);
}

async fn run(config: StartupConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = NewsClient::new(config.api_key.clone())?
        .with_base_url(config.base_url.clone())
        .with_query(config.query.clone());
    let ttl = chrono::Duration::from_std(config.feed.cache_ttl)?;
    let cache = Arc::new(TtlCache::new(ttl));

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config.feed, cache, Arc::new(client));
    app.start();

    // Main event loop
    loop {
        terminal.draw(|f| {
            app.visible_rows = ui::visible_article_rows(f.area(), &app);
            render_ui(f, &app);
        })?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        app.poll_fetches();

        if app.should_quit {
            break;
        }
    }

    app.shutdown();
    info!("Shutting down");

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match logging::init(config.log_file.as_deref()) {
        Ok(path) => info!("Logging to {}", path.display()),
        Err(e) => eprintln!("Warning: logging disabled: {}", e),
    }
    if config.api_key.is_none() {
        warn!("No API key configured, using {}", config.base_url);
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
