//! Application entry point for the wisp painting canvas.
//!
//! This binary sets up logging and eframe/egui and delegates all interactive
//! logic and rendering to [`Viewer`] from the `viewer` module.

mod canvas_config;
mod viewer;

use canvas_config::CanvasConfig;
use tracing::{info, warn};
use viewer::Viewer;

/// Starts the native eframe application.
///
/// An optional first argument names a JSON file with a [`CanvasConfig`].
/// A file that cannot be loaded is reported and replaced by the presets.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt::fmt().init();

    let cfg = match std::env::args().nth(1) {
        Some(path) => match CanvasConfig::load(&path) {
            Ok(cfg) => {
                info!("loaded config from {path}");
                cfg
            }
            Err(e) => {
                warn!("{path}: {e}; using defaults");
                CanvasConfig::default()
            }
        },
        None => CanvasConfig::default(),
    };

    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "Wisp Canvas",
        options,
        Box::new(move |_cc| Ok(Box::new(Viewer::new(cfg)))),
    )
}
