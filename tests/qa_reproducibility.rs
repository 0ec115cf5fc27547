use photon_geodesic::geodesic::metamorphic::{
    check_conservation, check_determinism, check_execution_independence, check_mirror_symmetry,
    CONSERVATION_TOLERANCE, MIRROR_TOLERANCE,
};
use photon_geodesic::prelude::*;

#[allow(clippy::unwrap_used)]
fn run(config: &SimConfig, ticks: u64) -> SimulationDriver {
    let mut driver = SimulationDriver::from_config(config).unwrap();
    driver.run(ticks);
    driver
}

// H0: Two runs of the same configuration diverge
// Falsification: Run the beam preset 10 times; compare snapshot fingerprints
#[test]
fn h0_1_same_config_produces_identical_outputs() {
    let config = SimConfig::sagittarius_beam();
    let first = run(&config, 200).snapshot().fingerprint();

    for i in 1..10 {
        let fingerprint = run(&config, 200).snapshot().fingerprint();
        assert_eq!(first, fingerprint, "Run {i} diverged from run 0");
    }
}

// H0: Parallel execution changes the trajectories
// Falsification: Compare sequential, global-pool and sized-pool runs bitwise
#[test]
fn h0_2_parallel_matches_sequential() {
    let mut sequential = SimConfig::sagittarius_beam();
    sequential.execution.parallel = false;
    let mut global = sequential.clone();
    global.execution.parallel = true;
    let mut pooled = global.clone();
    pooled.execution.worker_threads = Some(3);

    let expected = run(&sequential, 700).snapshot();
    for config in [&global, &pooled] {
        let actual = run(config, 700).snapshot();
        assert_eq!(expected, actual);
        assert_eq!(expected.fingerprint(), actual.fingerprint());
    }
}

// H0: The fingerprint ignores trajectory detail
// Falsification: Advance one extra tick and check the hash moves
#[test]
fn h0_3_fingerprint_tracks_state() {
    let config = SimConfig::sagittarius_beam();
    let mut driver = run(&config, 50);
    let before = driver.snapshot().fingerprint_hex();
    driver.tick();
    let after = driver.snapshot().fingerprint_hex();

    assert_ne!(before, after);
    assert_eq!(before.len(), 64);
}

// H0: Mirroring the scene across the source axis breaks the symmetry of the paths
// Falsification: Reflect every photon in y and compare trajectories point by point
#[test]
fn h0_4_mirror_symmetry_holds() {
    let result = check_mirror_symmetry(&SimConfig::sagittarius_beam(), 800, MIRROR_TOLERANCE);
    assert!(result.passed, "{}: {}", result.relation, result.details);
}

// H0: Conserved quantities drift beyond tolerance away from the horizon
// Falsification: Track max relative L and E drift over the full capture window
#[test]
fn h0_5_conservation_within_tolerance() {
    let result = check_conservation(&SimConfig::sagittarius_beam(), 800, CONSERVATION_TOLERANCE);
    assert!(result.passed, "{}: {}", result.relation, result.details);
    assert!(result.error < CONSERVATION_TOLERANCE);
}

// H0: The metamorphic harness itself is nondeterministic
// Falsification: Determinism and execution-independence relations on the preset
#[test]
fn h0_6_relations_report_zero_error() {
    let config = SimConfig::sagittarius_beam();
    for result in [
        check_determinism(&config, 100),
        check_execution_independence(&config, 100),
    ] {
        assert!(result.passed, "{}: {}", result.relation, result.details);
        assert!(result.error.abs() < f64::EPSILON);
    }
}
