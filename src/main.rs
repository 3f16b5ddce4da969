//! # Staging Server - Entry Point
//! src/main.rs
//!
//! Parsea la configuración, instala el subscriber de logs y corre el accept
//! loop hasta que el proceso termine.

use staging_server::config::Config;
use staging_server::server::Server;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,staging_server=debug")),
        )
        .init();

    let config = Config::load();
    info!(
        address = %config.address(),
        root = config.root(),
        workers = config.workers,
        slots = config.slots,
        memory_mb = config.memory_mb,
        "starting staging server"
    );

    let server = match Server::bind(&config) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        error!(error = %e, "accept loop failed");
        std::process::exit(1);
    }
}
