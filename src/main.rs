use anyhow::Result;

mod app;
mod config;
mod handler;
mod render;
mod state;
mod transport;
mod tui;
mod ui;

use app::App;
use config::Config;
use transport::SentinelClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Endpoint is resolved once at startup and injected into the client;
    // it never changes for the lifetime of the process.
    let config = Config::load().unwrap_or_else(|_| Config::new());
    let client = SentinelClient::new(config.endpoint());
    let mut app = App::new(client);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = run(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, events: &mut tui::EventHandler, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(app, event)?;
        }

        // Resolve the in-flight send, if any; ticks keep the loop moving
        // while we wait on the worker.
        app.poll_send_task().await;
    }

    Ok(())
}
