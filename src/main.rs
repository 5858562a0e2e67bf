mod app;
mod config;
mod editor;
mod error;
mod filter;
mod preview;
mod processing;

use app::PhotodeskApp;
use config::AppConfig;

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load();
    let width = config.window_width.unwrap_or(1200.0);
    let height = config.window_height.unwrap_or(800.0);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Photodesk")
            .with_app_id("photodesk")
            .with_inner_size([width, height]),
        ..Default::default()
    };

    eframe::run_native(
        "photodesk",
        native_options,
        Box::new(|cc| Ok(Box::new(PhotodeskApp::new(cc, config)))),
    )
}
