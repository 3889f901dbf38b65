use anyhow::{Context, Result};
use samchat_core::orchestrator::wait_for_shutdown;
use samchat_core::{BubbleLayoutEngine, Config, ResponderGateway, TurnOrchestrator};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

/// Logs go to a file; stderr belongs to the terminal UI
fn init_logging() -> Result<WorkerGuard> {
    let log_dir = dirs::data_local_dir()
        .context("no local data directory")?
        .join("samchat");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating {}", log_dir.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&log_dir, "samchat.log"));

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SAMCHAT_LOG")
                .unwrap_or_else(|_| EnvFilter::new("samchat=info,samchat_core=info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = init_logging()?;

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "could not load config file, using defaults");
        Config::new().apply_env(|key| std::env::var(key).ok())
    });
    let provider = config.provider();
    let model = config.generation_options().model;
    info!(provider = provider.as_str(), model = %model, "starting samchat");

    let session = TurnOrchestrator::open(
        ResponderGateway::from_config(&config),
        BubbleLayoutEngine::terminal(),
        config.completion_order(),
    );
    let mut app = App::new(session, provider, model);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    info!(turns = app.session.log().len(), "samchat exited");
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let deadline = app.session.shutdown_deadline();
        tokio::select! {
            event = events.next() => match event {
                Some(event) => handler::handle_event(app, event)?,
                None => break,
            },
            Some(completion) = app.session.next_completion() => app.session.apply(completion),
            _ = wait_for_shutdown(deadline) => {
                info!("farewell delay elapsed, closing");
                app.should_quit = true;
            }
        }
    }

    Ok(())
}
