mod api;
mod app;
mod config;
mod error;
mod player;
mod ui;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::api::{ContentFacade, Registry};
use crate::app::App;
use crate::config::Config;
use crate::error::Result;

fn setup_logging() -> Result<()> {
    let data_dir = config::data_dir()?;
    std::fs::create_dir_all(&data_dir)?;

    let file_appender = tracing_appender::rolling::daily(&data_dir, "kanshi.log");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kanshi=info")))
        .with(fmt::layer().with_writer(file_appender).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Log to a file, the terminal belongs to the TUI
    if let Err(e) = setup_logging() {
        eprintln!("Warning: Could not set up logging: {}", e);
    }

    info!("Starting kanshi");

    let config = Config::load()?;
    info!(default_provider = %config.general.default_provider, "Loaded config");

    let registry = Registry::from_config(&config.providers)?;
    let facade = ContentFacade::new(registry);

    let mut terminal = app::init_terminal()?;

    let accent = ui::widgets::parse_accent_color(&config.ui.accent_color);
    let _ = app::play_splash(&mut terminal, accent);

    let mut app = App::new(config, facade);
    let result = app.run(&mut terminal).await;

    app::restore_terminal()?;

    result
}
