use clap::Parser;
use ladder_server::{telemetry, Cli, ServerConfig, StoreConfig};
use std::process::ExitCode;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ServerConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };

    let _guard = match telemetry::init_tracing(&config.log) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };

    let backend = match &config.store {
        StoreConfig::Memory { .. } => "memory",
        StoreConfig::Postgres { .. } => "postgres",
    };
    info!(bind = %config.bind, backend, "starting ladder-server");

    match ladder_server::run(config, shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            warn!(error = %e, "cannot listen for ctrl-c, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
