use mdsim::core::collision::{resolve_pairs, OVERLAP_TOLERANCE};
use mdsim::core::{Phase, Simulation};
use mdsim::sink::NullSink;
use mdsim::SimConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn busy_config() -> SimConfig {
    let mut cfg = SimConfig::default();
    cfg.system.num_particles = 12;
    cfg.run.num_steps = 400;
    cfg.forces.rebel.probability = 0.1;
    cfg.collisions.stick_probability = 0.5;
    cfg
}

/// Every particle stays inside the box after every step.
#[test]
fn walls_contain_particles() -> mdsim::error::Result<()> {
    let cfg = busy_config();
    let limit = cfg.half_box() - cfg.wall_radius();
    let mut sim = Simulation::new(cfg, Some(2024))?;
    while sim.phase() != Phase::Done {
        sim.step()?;
        for p in &sim.particles {
            for x in p.r {
                assert!(x.abs() <= limit + 1e-12, "coordinate {x} outside ±{limit}");
            }
        }
    }
    Ok(())
}

/// Pair resolution leaves no two cores interpenetrating, however crowded the system.
#[test]
fn resolved_cores_never_overlap() -> mdsim::error::Result<()> {
    let cfg = busy_config();
    let collisions = cfg.collisions.clone();
    let mut sim = Simulation::new(cfg, Some(404))?;
    let mut rng = StdRng::seed_from_u64(404);
    while sim.phase() != Phase::Done {
        sim.step()?;
        let mut ps = sim.particles.clone();
        let mut clusters = sim.clusters().clone();
        resolve_pairs(&mut ps, &mut clusters, &collisions, &mut rng);
        for (i, a) in ps.iter().enumerate() {
            for b in &ps[i + 1..] {
                let d = (0..3).map(|k| (a.r[k] - b.r[k]).powi(2)).sum::<f64>().sqrt();
                assert!(
                    d >= a.radius + b.radius - OVERLAP_TOLERANCE,
                    "step {}: cores at {d}",
                    sim.step_count()
                );
            }
        }
    }
    Ok(())
}

/// Cluster labels always form a partition of the particle indices.
#[test]
fn clusters_partition_particles() -> mdsim::error::Result<()> {
    let mut sim = Simulation::new(busy_config(), Some(77))?;
    for _ in 0..100 {
        sim.advance(4)?;
        let clusters = sim.clusters();
        let mut seen: Vec<usize> = clusters.groups().into_iter().flatten().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..sim.num_particles()).collect::<Vec<_>>());
        for i in 0..sim.num_particles() {
            for j in clusters.members(i) {
                assert!(clusters.same_cluster(i, j));
                assert!(clusters.members(j).contains(&i));
            }
        }
    }
    Ok(())
}

/// State stays finite over a long run with every force term switched on.
#[test]
fn all_terms_stay_finite() -> mdsim::error::Result<()> {
    let mut cfg = busy_config();
    cfg.run.num_steps = 1000;
    cfg.forces.k_inverse_square = 0.5;
    cfg.forces.k_pair = 2.0;
    cfg.forces.confinement.k_restoring = 1.0;
    cfg.integrator.velocity_cutoff = 1e-3;
    let mut sim = Simulation::new(cfg, Some(5))?;
    let summary = sim.run(&mut NullSink, None)?;
    assert_eq!(summary.steps, 1000);
    for p in &sim.particles {
        assert!(p.r.iter().chain(p.v.iter()).all(|x| x.is_finite()));
    }
    let e = summary.final_energy.expect("energy after run");
    assert!(e.total.is_finite());
    assert_eq!(sim.energy_log().len(), 1000);
    Ok(())
}

/// Heavy damping and no kicks drain almost all kinetic energy.
#[test]
fn damping_cools_the_system() -> mdsim::error::Result<()> {
    let mut cfg = busy_config();
    cfg.forces.rebel.probability = 0.0;
    cfg.integrator.damping = 0.8;
    let mut sim = Simulation::new(cfg, Some(9))?;
    let e0 = sim.kinetic_energy();
    sim.advance(400)?;
    assert!(sim.kinetic_energy() < 0.05 * e0);
    Ok(())
}

/// With confinement switched off, damping at 1 and no forces, kinetic energy only changes
/// through collisions, which are elastic.
#[test]
fn free_gas_conserves_kinetic_energy() -> mdsim::error::Result<()> {
    let mut cfg = SimConfig::default();
    cfg.system.num_particles = 10;
    cfg.forces.confinement.enabled = false;
    cfg.forces.k_global = 0.0;
    cfg.forces.rebel.probability = 0.0;
    cfg.integrator.damping = 1.0;
    cfg.run.num_steps = 500;
    let mut sim = Simulation::new(cfg, Some(31))?;
    let e0 = sim.kinetic_energy();
    sim.advance(500)?;
    let rel = ((sim.kinetic_energy() - e0) / e0).abs();
    assert!(rel < 1e-9, "relative drift {rel}");
    Ok(())
}
