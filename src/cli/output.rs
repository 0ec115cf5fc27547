//! CLI output formatting.
//!
//! This module contains all output formatting functions for the CLI.
//! Formatting returns strings so it can be tested without capturing stdout.

use std::fmt::Write as _;

use crate::engine::{Diagnostic, Snapshot};
use crate::error::SimResult;
use crate::geodesic::jidoka::GuardReport;
use crate::geodesic::metamorphic::MetamorphicResult;
use crate::geodesic::ray::RayStatus;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Version string, with the git hash when the build captured one.
#[must_use]
pub fn version_string() -> String {
    match option_env!("GIT_HASH").filter(|h| !h.is_empty()) {
        Some(hash) => format!(
            "photon-geodesic {} ({})",
            env!("CARGO_PKG_VERSION"),
            &hash[..hash.len().min(12)]
        ),
        None => format!("photon-geodesic {}", env!("CARGO_PKG_VERSION")),
    }
}

/// Print version information.
pub fn print_version() {
    println!("{}", version_string());
}

/// Print help message.
pub fn print_help() {
    println!(
        r"photon-geodesic - Light bending around a Schwarzschild black hole

USAGE:
    photon-geodesic <COMMAND> [OPTIONS]

COMMANDS:
    run <config.yaml>           Run a simulation
        --ticks <N>             Number of ticks (default: 600)
        --json                  Print the final snapshot as JSON

    verify <config.yaml>        Check the metamorphic relations
        --ticks <N>             Ticks per run (default: 600)

    demo                        Run the Sagittarius A* beam preset
        --ticks <N>             Number of ticks (default: 600)
        --json                  Print the final snapshot as JSON

    help                        Show this help message
    version                     Show version information

EXAMPLES:
    photon-geodesic demo --ticks 800
    photon-geodesic run configs/lensing.yaml --json
    photon-geodesic verify configs/lensing.yaml --ticks 300

LOGGING:
    Set RUST_LOG (e.g. RUST_LOG=debug) to see horizon crossings and
    conservation warnings.
"
    );
}

/// Format a per-photon summary of a finished run.
#[must_use]
pub fn format_run_summary(
    snapshot: &Snapshot,
    diagnostics: &[Diagnostic],
    guard: Option<&GuardReport>,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Tick:     {}", snapshot.tick);
    let _ = writeln!(
        out,
        "Source:   ({:.4e}, {:.4e}) m, r_s = {:.4e} m",
        snapshot.source.position.x, snapshot.source.position.y, snapshot.source.horizon_radius
    );
    let _ = writeln!(
        out,
        "Photons:  {} active, {} absorbed",
        snapshot.active_count(),
        snapshot.absorbed_count()
    );
    let _ = writeln!(out, "{RULE}\n");

    for (index, ray) in snapshot.rays.iter().enumerate() {
        let sym = match ray.status {
            RayStatus::Active => "→",
            RayStatus::Absorbed => "●",
        };
        match ray.path.last() {
            Some(p) => {
                let _ = writeln!(
                    out,
                    "  {sym} #{index:<3} {:<8} {:>6} pts  last ({:.4e}, {:.4e})",
                    format!("{:?}", ray.status),
                    ray.path.len(),
                    p.x,
                    p.y
                );
            }
            None => {
                let _ = writeln!(out, "  {sym} #{index:<3} {:?}  no points", ray.status);
            }
        }
    }

    if !diagnostics.is_empty() {
        let _ = writeln!(out, "\nDiagnostics:");
        for d in diagnostics {
            let _ = writeln!(
                out,
                "  tick {} ray {}: {} (r = {:.4e} m)",
                d.tick, d.ray_index, d.message, d.r
            );
        }
    }

    if let Some(report) = guard {
        let _ = writeln!(out, "\nConservation guard ({:?}):", report.worst());
        let _ = writeln!(out, "  Checked:  {}", report.checked);
        let _ = writeln!(out, "  Max L drift: {:.2e}", report.max_angular_momentum_drift);
        let _ = writeln!(out, "  Max E drift: {:.2e}", report.max_energy_drift);
    }

    out
}

/// Print a per-photon summary of a finished run.
pub fn print_run_summary(
    snapshot: &Snapshot,
    diagnostics: &[Diagnostic],
    guard: Option<&GuardReport>,
) {
    print!("{}", format_run_summary(snapshot, diagnostics, guard));
}

/// Render a snapshot as pretty JSON.
///
/// # Errors
///
/// Returns error if serialization fails.
pub fn format_snapshot_json(snapshot: &Snapshot) -> SimResult<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

/// Format metamorphic results with an overall verdict.
#[must_use]
pub fn format_metamorphic_results(results: &[MetamorphicResult]) -> String {
    let mut out = String::new();
    let passed = results.iter().filter(|r| r.passed).count();

    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Metamorphic Relations");
    let _ = writeln!(out, "{RULE}\n");

    for result in results {
        let sym = if result.passed { "✓" } else { "✗" };
        let _ = writeln!(
            out,
            "  {sym} {:<24} error {:.2e} (tolerance {:.2e})",
            result.relation, result.error, result.tolerance
        );
        if !result.details.is_empty() {
            let _ = writeln!(out, "      {}", result.details);
        }
    }

    let status = if passed == results.len() { "PASSED" } else { "FAILED" };
    let _ = writeln!(out, "\n{RULE}");
    let _ = writeln!(out, "Result: {status} ({passed}/{})", results.len());
    let _ = writeln!(out, "{RULE}");

    out
}

/// Print metamorphic results.
pub fn print_metamorphic_results(results: &[MetamorphicResult]) {
    print!("{}", format_metamorphic_results(results));
}
