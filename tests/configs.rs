use std::path::Path;

use mdsim::config::{IntegratorMode, WallContact};
use mdsim::core::Simulation;
use mdsim::SimConfig;

fn load(name: &str) -> mdsim::error::Result<SimConfig> {
    SimConfig::load(Path::new(env!("CARGO_MANIFEST_DIR")).join("configs").join(name))
}

/// Every shipped configuration parses, validates and can start a simulation.
#[test]
fn shipped_configs_load_and_run() -> mdsim::error::Result<()> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs");
    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            continue;
        }
        let cfg = SimConfig::load(&path)?;
        let mut sim = Simulation::new(cfg, Some(11))?;
        sim.advance(20)?;
        assert!(sim.positions().iter().flatten().all(|x| x.is_finite()));
        count += 1;
    }
    assert_eq!(count, 4);
    Ok(())
}

#[test]
fn confined_cluster_matches_defaults() -> mdsim::error::Result<()> {
    assert_eq!(load("confined_cluster.toml")?, SimConfig::default());
    Ok(())
}

#[test]
fn variant_specific_values() -> mdsim::error::Result<()> {
    let shells = load("soft_shells.toml")?;
    assert_eq!(shells.integrator.mode, IntegratorMode::SecondOrder);
    assert_eq!(shells.output.precision, 6);
    assert!(!shells.forces.confinement.enabled);
    assert_eq!(shells.forces.k_global, 3.0);
    assert_eq!(shells.forces.k_inverse_square, 4.0);
    assert_eq!(shells.forces.k_pair, -30.0);
    assert_eq!(shells.collisions.wall_contact, WallContact::Core);

    let defaults = load("confined_cluster.toml")?;
    assert_eq!(defaults.forces.k_global, 11.2);
    assert_eq!(defaults.forces.rebel.magnitude, 22.4);

    let sweep = load("element_sweep.toml")?;
    assert_eq!(sweep.forces.confinement.k_restoring, 0.0);
    assert_eq!(sweep.forces.k_global, 1.0);
    assert_eq!(sweep.forces.rebel.magnitude, 0.2);

    let head_on = load("head_on_damped.toml")?;
    assert_eq!(head_on.system.num_particles, 2);
    assert!((head_on.collisions.restitution - 0.6).abs() < 1e-12);
    Ok(())
}

#[test]
fn bad_values_are_rejected() {
    assert!(SimConfig::from_toml_str("[system]\nnum_particles = \"six\"\n").is_err());
    let err = SimConfig::from_toml_str("[run]\nnum_steps = 0\n").unwrap_err();
    assert!(matches!(err, mdsim::Error::Config(_)));
}
