use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

mod config;
mod directory;
mod handler;
mod http;
mod logger;
mod server;

/// Config file used when none is given on the command line (extension optional)
const DEFAULT_CONFIG_PATH: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::Config::load_from(&config_path)?;

    logger::init(&cfg)?;

    // Worker thread count from config, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;

    let state = Arc::new(config::AppState::new(&cfg));
    let active_connections = Arc::new(AtomicUsize::new(0));

    let shutdown = Arc::new(server::ShutdownSignal::new());
    server::start_signal_handler(Arc::clone(&shutdown))?;

    logger::log_server_start(&addr, &cfg, state.directory.list_employees().len());

    // Connections are served with spawn_local
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(
            listener,
            state,
            active_connections,
            shutdown,
        ))
        .await
}
