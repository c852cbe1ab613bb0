use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use streamdock_core::{DEFAULT_CONFIG_PATH, HostRunner, Store};
use streamdock_server::{AppState, serve};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "streamdock-server")]
struct ServerArgs {
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind_address: String,

    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config_path: PathBuf,

    /// Seconds a privileged host command may run before it is killed.
    #[arg(long, default_value_t = 30)]
    action_timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = ServerArgs::parse();
    let store = Arc::new(Store::open(&args.config_path));
    let runner = Arc::new(HostRunner::new(Duration::from_secs(args.action_timeout_secs)));
    let state = AppState::new(store, runner);

    let listener = match tokio::net::TcpListener::bind(&args.bind_address).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {}: {}", args.bind_address, err);
            std::process::exit(1);
        }
    };

    info!("streamdock server starting on {}", args.bind_address);
    if let Err(err) = serve(listener, state).await {
        warn!("server exited: {}", err);
    }
}
