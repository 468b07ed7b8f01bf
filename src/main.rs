use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

use spa_serve::cli::Cli;
use spa_serve::config::{AppState, Config};
use spa_serve::error::StartupError;
use spa_serve::logger;
use spa_serve::server::{self, ShutdownSignal};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), StartupError> {
    let cfg = Config::load_from(&cli.config, cli.overrides())?;
    let addr = cfg.get_socket_addr().map_err(StartupError::InvalidAddress)?;

    // Root is checked before anything is bound
    let state = Arc::new(AppState::new(cfg)?);
    logger::init(&state.config).map_err(StartupError::Logger)?;

    // Multi-thread runtime; worker count from `server.workers` when set
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = state.config.server.workers {
        runtime_builder.worker_threads(workers.max(1));
    }
    let runtime = runtime_builder.build().map_err(StartupError::Runtime)?;

    runtime.block_on(async_main(addr, state))
}

async fn async_main(addr: std::net::SocketAddr, state: Arc<AppState>) -> Result<(), StartupError> {
    let listener = server::create_listener(addr).map_err(|e| StartupError::Bind(addr, e))?;

    let signal = Arc::new(ShutdownSignal::new());
    server::start_signal_handler(Arc::clone(&signal)).map_err(StartupError::Signal)?;

    let local_addr = listener.local_addr().unwrap_or(addr);
    logger::log_server_start(&local_addr, &state.serve_root, &state.config);

    // Forced and timed-out shutdowns still count as a clean exit
    let _kind = server::start_server_loop(listener, state, signal).await;
    Ok(())
}
