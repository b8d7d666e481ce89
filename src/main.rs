//! makelove - package LÖVE games
//!
//! Entry point for the makelove command-line application.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use makelove::cli::output::display_error;
use makelove::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("makelove={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli.run().await {
        display_error(&e);
        std::process::exit(1);
    }
}
