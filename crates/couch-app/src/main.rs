//! couchmode entry point.
//!
//! Loads the configuration, discovers desktop entries, rasterizes their
//! icons, starts the CEC remote bridge, and runs the launcher loop until
//! the user quits or picks the desktop entry.
//!
//! Usage: `couchmode [config.toml]`

use anyhow::{Context, Result};

use couch_backend_sdl::{SdlBackend, WindowSettings};
use couch_core::assets::{AssetResolver, DEFAULT_BACKGROUND_BLUR, expand_home, load_background};
use couch_core::config::{CouchConfig, find_config, resolve_entries};
use couch_core::desktop;
use couch_core::driver::Driver;
use couch_core::nav::Grid;
use couch_core::remote::RemoteControl;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli_path = std::env::args().nth(1);
    let config_path = find_config(cli_path.as_deref());
    let config = CouchConfig::load(config_path.as_deref()).context("loading configuration")?;
    let (width, height) = config.resolution;
    log::info!("Starting couchmode ({width}x{height}, {} columns)", config.columns);

    let discovered = desktop::discover(&config.app_dir_paths());
    let mut entries = resolve_entries(&config, &discovered);
    if entries.is_empty() {
        log::warn!("No entries to show");
    }

    let mut resolver = AssetResolver::default();
    resolver.load_icons(&mut entries, config.icon_dims(), config.theme.as_deref());
    let background = config
        .background
        .as_deref()
        .and_then(|path| load_background(path, config.resolution, DEFAULT_BACKGROUND_BLUR));

    let backend = SdlBackend::new(WindowSettings {
        title: "Couch Mode".to_string(),
        width,
        height,
        fullscreen: config.fullscreen,
        font: config.font.as_deref().map(expand_home),
    })
    .context("initializing display")?;

    let remote = RemoteControl::start(&config.bridge);
    let grid = Grid::new(entries, config.columns);
    let mut driver = Driver::new(backend, grid, remote, config.resolution, config.icon_size)
        .with_fps(config.fps)
        .with_axis_threshold(config.axis_threshold)
        .with_background(background);
    driver.run()?;

    log::info!("couchmode exited");
    Ok(())
}
