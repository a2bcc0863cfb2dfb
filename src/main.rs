mod app;
mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use vitrine_runtime::ViewerEvent;
use vitrine_state::ViewerState;
use winit::event_loop::{DeviceEvents, EventLoop};

use crate::app::App;
use crate::cli::Cli;
use crate::config::ViewerConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = ViewerConfig::load(&cli.config)?;
    let catalog = config.catalog()?;
    let settings = config.view_settings()?;
    log::info!(
        "{} models from {}",
        catalog.len(),
        config.models_dir().display()
    );
    let viewer = ViewerState::new(catalog, settings);

    let event_loop = EventLoop::<ViewerEvent>::with_user_event()
        .build()
        .context("failed to create the event loop")?;
    event_loop.listen_device_events(DeviceEvents::Always);

    let mut app = App::new(&event_loop, viewer);
    event_loop.run_app(&mut app)?;
    Ok(())
}
