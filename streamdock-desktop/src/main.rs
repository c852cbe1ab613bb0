use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use eframe::egui;
use streamdock_core::{ActionRunner, DEFAULT_CONFIG_PATH, HostRunner, Store};
use streamdock_desktop::{app::DesktopApp, bootstrap};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "streamdock-desktop")]
struct DesktopArgs {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config_path: PathBuf,

    /// Seconds a privileged host command may run before it is killed.
    #[arg(long, default_value_t = 30)]
    action_timeout_secs: u64,

    /// Start windowed instead of fullscreen.
    #[arg(long, default_value_t = false)]
    windowed: bool,
}

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = DesktopArgs::parse();
    let store = Arc::new(Store::open(&args.config_path));
    bootstrap::apply_env_overrides(&store.settings());

    let runner: Arc<dyn ActionRunner> = Arc::new(HostRunner::new(Duration::from_secs(
        args.action_timeout_secs,
    )));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_fullscreen(!args.windowed),
        ..Default::default()
    };

    info!(
        "starting launcher ui with profile '{}'",
        store.active_profile()
    );
    eframe::run_native(
        "StreamDock",
        options,
        Box::new(move |cc| Ok(Box::new(DesktopApp::new(&cc.egui_ctx, store, runner)))),
    )
}
