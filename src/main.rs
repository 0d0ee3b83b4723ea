#![allow(dead_code)]

mod analysis;
mod app;
mod chart;
mod config;
mod data;
mod error;
mod figures;
mod gui;
mod log;
mod report;

use app::ReportApp;
use config::ReportConfig;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let config = ReportConfig::load();
    ::log::info!(
        "Starting {} v{} ({} mode)",
        config.report_title,
        env!("CARGO_PKG_VERSION"),
        if config.local_mode { "local" } else { "object store" }
    );

    let title = config.report_title.clone();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(|cc| Ok(Box::new(ReportApp::new(cc, config)))),
    )
}
