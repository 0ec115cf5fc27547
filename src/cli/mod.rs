//! CLI module for photon-geodesic.
//!
//! This module contains all CLI logic extracted from main.rs to enable
//! full test coverage. The entry point `run_cli` can be called from main.rs
//! with parsed arguments.

mod args;
mod commands;
mod output;

pub use args::{Args, Command, DEFAULT_TICKS};
pub use commands::{run_cli, run_demo, run_simulation, simulate, verify_relations};
pub use output::{
    format_metamorphic_results, format_run_summary, format_snapshot_json, print_help,
    print_metamorphic_results, print_run_summary, print_version, version_string,
};
