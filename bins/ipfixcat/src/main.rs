mod cmd;
mod config;
mod error;

use clap::Parser;
use config::{Cli, Effective};

#[tokio::main]
async fn main() {
    // stdout занят записями, логи только в stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ipfixcat");

    let eff = match Effective::new(&cli) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match cmd::run::run(&eff).await {
        // Pump может висеть на блокирующем чтении stdin: выходим сразу,
        // не дожидаясь остановки runtime.
        Ok(_) => std::process::exit(0),
        Err(e) => {
            tracing::error!(error = %e, "ipfixcat failed");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
