use std::sync::Arc;

use anyhow::{Context, Result};
use chatbot_core::{ChatSession, Config, GeminiClient};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    match logging::init() {
        Ok(path) => tracing::debug!(path = %path.display(), "logging initialized"),
        Err(e) => eprintln!("Warning: file logging disabled: {:#}", e),
    }

    // Settle configuration before touching the terminal so errors print plainly
    let (config, config_path) = Config::load()?;
    let settings = config
        .resolve(&config_path)
        .context("Failed to resolve API settings")?;

    let client = GeminiClient::new(settings);
    tracing::info!(model = client.model(), endpoint = %client.endpoint(), "starting chatbot");

    let model = client.model().to_string();
    let mut app = App::new(ChatSession::new(Arc::new(client)), model);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    if let Err(e) = &result {
        tracing::error!(error = %e, "chatbot exited with error");
    }
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }

    if app.pending.is_some() {
        tracing::info!("quitting with a reply still in flight");
    }
    Ok(())
}
