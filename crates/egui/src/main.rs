mod app;
mod config;
mod keybindings;
mod platform;
mod theme;

use eframe::egui;
use tracing_subscriber::EnvFilter;

use app::PlayerApp;
use config::Config;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::load();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("player-runtime")
        .enable_all()
        .build()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([420.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Offline Music Player",
        options,
        Box::new(move |cc| Ok(Box::new(PlayerApp::new(&cc.egui_ctx, runtime, config)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
