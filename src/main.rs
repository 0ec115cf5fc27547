//! photon-geodesic CLI
//!
//! Command-line interface for running photon simulations.

use std::process::ExitCode;

use photon_geodesic::cli::{run_cli, Args};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    run_cli(Args::parse())
}
