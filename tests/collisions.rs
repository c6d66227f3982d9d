use mdsim::core::{Particle, Simulation};
use mdsim::SimConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// No forces, no damping, no randomness: only collisions move the velocities.
fn free_flight(n: usize, core: f64, shell: f64, mass: f64) -> SimConfig {
    let mut cfg = SimConfig::default();
    cfg.system.num_particles = n;
    cfg.system.core_radius = core;
    cfg.system.shell_radius = shell;
    cfg.system.mass = mass;
    cfg.forces.confinement.enabled = false;
    cfg.forces.k_global = 0.0;
    cfg.forces.rebel.probability = 0.0;
    cfg.collisions.stick_probability = 0.0;
    cfg.integrator.damping = 1.0;
    cfg.run.num_steps = 40;
    cfg
}

/// Two equal masses approaching head-on exchange velocities and fly apart.
#[test]
fn head_on_pair_swaps_velocities() -> mdsim::error::Result<()> {
    let cfg = free_flight(2, 1.15, 1.15, 195.0);
    let particles = vec![
        Particle::new(0, [-2.0, 0.0, 0.0], [1.0, 0.0, 0.0], 1.15, 1.15, 195.0)?,
        Particle::new(1, [2.0, 0.0, 0.0], [-1.0, 0.0, 0.0], 1.15, 1.15, 195.0)?,
    ];
    let mut sim = Simulation::from_particles(cfg, particles, StdRng::seed_from_u64(0))?;
    let e0 = sim.kinetic_energy();

    sim.advance(40)?;

    let v = sim.velocities();
    assert!((v[0][0] + 1.0).abs() < 1e-12, "v0 = {:?}", v[0]);
    assert!((v[1][0] - 1.0).abs() < 1e-12, "v1 = {:?}", v[1]);
    assert!((sim.kinetic_energy() - e0).abs() < 1e-9);
    assert_eq!(sim.collision_totals().hard_core, 1);

    let r = sim.positions();
    assert!(r[1][0] - r[0][0] >= 2.3 - 1e-9);
    assert!((r[0][0] + r[1][0]).abs() < 1e-9, "pair should stay symmetric");
    Ok(())
}

/// Restitution below one removes part of the approach speed.
#[test]
fn inelastic_head_on_loses_energy() -> mdsim::error::Result<()> {
    let mut cfg = free_flight(2, 1.15, 1.15, 195.0);
    cfg.collisions.restitution = 0.5;
    let particles = vec![
        Particle::new(0, [-2.0, 0.0, 0.0], [1.0, 0.0, 0.0], 1.15, 1.15, 195.0)?,
        Particle::new(1, [2.0, 0.0, 0.0], [-1.0, 0.0, 0.0], 1.15, 1.15, 195.0)?,
    ];
    let mut sim = Simulation::from_particles(cfg, particles, StdRng::seed_from_u64(0))?;
    sim.advance(40)?;
    let v = sim.velocities();
    // separation speed = restitution * approach speed
    assert!((v[1][0] - v[0][0] - 1.0).abs() < 1e-12);
    assert!((v[0][0] + v[1][0]).abs() < 1e-12, "momentum is conserved");
    Ok(())
}

/// A resting pair inside the sticking band merges when sticking is certain.
#[test]
fn resting_pair_in_band_sticks() -> mdsim::error::Result<()> {
    let mut cfg = free_flight(3, 1.0, 1.5, 100.0);
    cfg.collisions.stick_probability = 1.0;
    let particles = vec![
        Particle::new(0, [-1.25, 0.0, 0.0], [0.0; 3], 1.0, 1.5, 100.0)?,
        Particle::new(1, [1.25, 0.0, 0.0], [0.0; 3], 1.0, 1.5, 100.0)?,
        Particle::new(2, [0.0, 6.0, 0.0], [0.0; 3], 1.0, 1.5, 100.0)?,
    ];
    let mut sim = Simulation::from_particles(cfg, particles, StdRng::seed_from_u64(1))?;
    sim.step()?;

    let clusters = sim.clusters();
    assert!(clusters.same_cluster(0, 1));
    assert!(clusters.is_singleton(2));
    assert_eq!(clusters.num_multi(), 1);
    assert_eq!(sim.collision_totals().merges, 1);

    // Already merged pairs are not counted again.
    sim.advance(5)?;
    assert_eq!(sim.collision_totals().merges, 1);
    Ok(())
}

/// A hard-core hit breaks up the cluster of both partners.
#[test]
fn hard_core_hit_dissolves_cluster() -> mdsim::error::Result<()> {
    let mut cfg = free_flight(2, 1.0, 1.5, 100.0);
    cfg.collisions.stick_probability = 1.0;
    let particles = vec![
        Particle::new(0, [-1.5, 0.0, 0.0], [0.5, 0.0, 0.0], 1.0, 1.5, 100.0)?,
        Particle::new(1, [1.5, 0.0, 0.0], [-0.5, 0.0, 0.0], 1.0, 1.5, 100.0)?,
    ];
    let mut sim = Simulation::from_particles(cfg, particles, StdRng::seed_from_u64(2))?;

    let mut merged = false;
    let mut dissolved = false;
    for _ in 0..40 {
        sim.step()?;
        if sim.clusters().same_cluster(0, 1) {
            merged = true;
        } else if merged {
            dissolved = true;
            break;
        }
    }
    assert!(merged, "pair should stick while passing through the band");
    assert!(dissolved, "core contact should split the pair again");
    assert!(sim.collision_totals().hard_core >= 1);
    Ok(())
}

#[test]
fn particle_count_must_match_config() {
    let cfg = free_flight(3, 1.0, 1.5, 1.0);
    let particles = vec![Particle::new(0, [0.0; 3], [0.0; 3], 1.0, 1.5, 1.0).expect("valid")];
    let err = Simulation::from_particles(cfg, particles, StdRng::seed_from_u64(0)).unwrap_err();
    assert!(matches!(err, mdsim::Error::Config(_)));
}

#[test]
fn particle_radii_must_match_config() {
    let cfg = free_flight(2, 1.0, 1.5, 1.0);
    let particles = vec![
        Particle::new(0, [-3.0, 0.0, 0.0], [0.0; 3], 1.0, 1.5, 1.0).expect("valid"),
        Particle::new(1, [3.0, 0.0, 0.0], [0.0; 3], 0.5, 1.5, 1.0).expect("valid"),
    ];
    let err = Simulation::from_particles(cfg, particles, StdRng::seed_from_u64(0)).unwrap_err();
    assert!(matches!(err, mdsim::Error::Config(_)));
    assert!(err.to_string().contains("particle 1"));
}

#[test]
fn particles_must_start_inside_walls() {
    // Box 20 with shell contact: centres must stay within ±8.5.
    let cfg = free_flight(2, 1.0, 1.5, 1.0);
    let particles = vec![
        Particle::new(0, [0.0, 0.0, 8.5], [0.0; 3], 1.0, 1.5, 1.0).expect("valid"),
        Particle::new(1, [0.0, 9.0, 0.0], [0.0; 3], 1.0, 1.5, 1.0).expect("valid"),
    ];
    let err = Simulation::from_particles(cfg, particles, StdRng::seed_from_u64(0)).unwrap_err();
    assert!(matches!(err, mdsim::Error::Config(_)));
    assert!(err.to_string().contains("particle 1"));
}
