mod app;
mod config;
mod keys;

use app::UiApp;
use config::AppConfig;
use eframe::{NativeOptions, egui};

const APP_VERSION: &str = env!("IMAGE_REVIEW_VERSION");

fn main() {
    tracing_subscriber::fmt::init();
    tracing::info!("Image Viewer {APP_VERSION} starting");

    let config = AppConfig::load();
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1000.0, 600.0]),
        ..Default::default()
    };
    if let Err(e) = eframe::run_native(
        &format!("Image Viewer {APP_VERSION}"),
        options,
        Box::new(|_cc| Ok(Box::new(UiApp::new(config, APP_VERSION)))),
    ) {
        tracing::error!("Application stopped with error: {e}");
        eprintln!("Application stopped with error: {e}");
    }
}
