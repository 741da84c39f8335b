mod app;
mod chart;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use app::RustyOverlayApp;
use config::AppConfig;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => {
            log::error!("Using default config: {e:#}");
            (AppConfig::default(), Some(format!("Config error: {e:#}")))
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    let mut state = AppState::new(config);
    let preload: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if !preload.is_empty() {
        state.open_files(&preload);
    }
    state.status_message = config_error;

    eframe::run_native(
        "Rusty Overlay – Time-Series Comparison",
        options,
        Box::new(|_cc| Ok(Box::new(RustyOverlayApp::new(state)))),
    )
}
