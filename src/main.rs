mod api;
mod app;
mod components;
mod config;
mod logging;
mod models;
mod tui;

use anyhow::{Context, Result};
use api::http::HttpApi;
use app::App;
use config::AppConfig;
use crossterm::terminal::{self, LeaveAlternateScreen};
use ratatui::prelude::{CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use tui::Tui;

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    logging::init(&config.log_file)?;
    tracing::info!(
        "Starting clinic admin against {} (timeout {}s)",
        config.api.base_url,
        config.api.timeout_secs
    );

    let http = Arc::new(HttpApi::new(&config.api).context("Failed to build HTTP client")?);
    let config = Arc::new(config);

    let _guard = CleanupGuard;

    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    let mut tui = Tui::new(terminal);
    tui.init()?;

    let mut app = App::new(config, http.clone(), http);
    let res = app.run(&mut tui);

    tui.exit()?;

    match res {
        Ok(()) => tracing::info!("Clinic admin exited"),
        Err(e) => {
            tracing::error!("Application error: {e:#}");
            eprintln!("Application Error: {e}");
        }
    }
    Ok(())
}

struct CleanupGuard;

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        // Ignore errors during cleanup
        let _ = terminal::disable_raw_mode();
        let _ = crossterm::execute!(io::stdout(), LeaveAlternateScreen);
    }
}
