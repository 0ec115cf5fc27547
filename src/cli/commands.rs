//! CLI command handlers.
//!
//! This module contains the execution logic for each CLI command.
//! Extracted to enable comprehensive testing of command behavior.

use std::path::Path;
use std::process::ExitCode;

use tracing::info;

use crate::config::SimConfig;
use crate::engine::SimulationDriver;
use crate::geodesic::metamorphic::run_all_metamorphic_checks;

use super::output::{
    format_snapshot_json, print_help, print_metamorphic_results, print_run_summary, print_version,
};
use super::{Args, Command};

/// Main CLI entry point.
///
/// Dispatches to the appropriate command handler based on parsed arguments.
#[must_use]
pub fn run_cli(args: Args) -> ExitCode {
    match args.command {
        Command::Run {
            config_path,
            ticks,
            json,
        } => run_simulation(&config_path, ticks, json),
        Command::Verify { config_path, ticks } => verify_relations(&config_path, ticks),
        Command::Demo { ticks, json } => run_demo(ticks, json),
        Command::Help => {
            print_help();
            ExitCode::SUCCESS
        }
        Command::Version => {
            print_version();
            ExitCode::SUCCESS
        }
    }
}

fn banner(title: &str) {
    println!("╔═══════════════════════════════════════════════════════════════╗");
    println!("║ {title:<61} ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");
}

/// Simulate `config` for `ticks` ticks and report.
#[must_use]
pub fn simulate(config: &SimConfig, ticks: u64, json: bool) -> ExitCode {
    let mut driver = match SimulationDriver::from_config(config) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };

    let performed = driver.run(ticks);
    info!(requested = ticks, performed, "simulation finished");

    let snapshot = driver.snapshot();
    if json {
        match format_snapshot_json(&snapshot) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::from(1);
            }
        }
    } else {
        print_run_summary(&snapshot, driver.diagnostics(), driver.last_guard_report());
    }

    ExitCode::SUCCESS
}

/// Run a simulation from a YAML file.
///
/// # Arguments
///
/// * `path` - Path to the simulation YAML file
/// * `ticks` - Number of ticks to simulate
/// * `json` - Print the final snapshot as JSON instead of a summary
#[must_use]
pub fn run_simulation(path: &Path, ticks: u64, json: bool) -> ExitCode {
    let config = match SimConfig::load(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading {}: {e}", path.display());
            return ExitCode::from(1);
        }
    };

    if !json {
        banner("photon-geodesic - Simulation");
        println!("Config: {}", path.display());
        println!("Ticks:  {ticks}\n");
    }

    simulate(&config, ticks, json)
}

/// Run the Sagittarius A* beam preset.
#[must_use]
pub fn run_demo(ticks: u64, json: bool) -> ExitCode {
    if !json {
        banner("photon-geodesic - Sagittarius A* beam");
        println!("Ticks: {ticks}\n");
    }

    simulate(&SimConfig::sagittarius_beam(), ticks, json)
}

/// Check every metamorphic relation for a YAML file.
///
/// # Arguments
///
/// * `path` - Path to the simulation YAML file
/// * `ticks` - Ticks per run
#[must_use]
pub fn verify_relations(path: &Path, ticks: u64) -> ExitCode {
    banner("photon-geodesic - Metamorphic Verification");

    let config = match SimConfig::load(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading {}: {e}", path.display());
            return ExitCode::from(1);
        }
    };

    println!("Verifying: {}", path.display());
    println!("Ticks:     {ticks}\n");

    let results = run_all_metamorphic_checks(&config, ticks);
    print_metamorphic_results(&results);

    if results.iter().all(|r| r.passed) {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
