use crate::config::SimConfig;
use crate::core::cluster::ClusterSet;
use crate::core::collision::{self, PairStats};
use crate::core::forces::ForceModel;
use crate::core::integrator::Integrator;
use crate::core::particle::DIM;
use crate::core::vector::{self, Vec3};
use crate::core::Particle;
use crate::error::{Error, Result};
use crate::io::{SnapshotWriter, XyzRecord};
use crate::sink::{BodyView, FrameSink, Scene};
use rand::{rng, rngs::StdRng, Rng, SeedableRng};
use std::path::PathBuf;

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Placement in progress; construction either finishes it or fails.
    Initializing,
    Stepping,
    Exporting,
    Done,
}

/// System energy after one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySample {
    pub kinetic: f64,
    pub potential: f64,
    pub total: f64,
}

impl EnergySample {
    fn new(kinetic: f64, potential: f64) -> Self {
        Self {
            kinetic,
            potential,
            total: kinetic + potential,
        }
    }
}

/// What a call to [`Simulation::run`] did.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Steps executed by this call.
    pub steps: u64,
    /// Snapshots written successfully, in order.
    pub snapshots: Vec<PathBuf>,
    /// Snapshot writes that failed while `continue_on_error` was set.
    pub export_failures: usize,
    pub hard_core_collisions: usize,
    pub merges: usize,
    pub final_energy: Option<EnergySample>,
}

/// Fixed time-step simulation of confined atoms in a cubic box centred on the origin.
///
/// Each step:
/// 1. resolve every pair once (hard-core bounce or probabilistic sticking),
/// 2. per particle: accumulate forces, add the occasional rebel kick, integrate, reflect off
///    the walls,
/// 3. record the energy if tracking is enabled.
#[derive(Debug)]
pub struct Simulation<R = StdRng> {
    config: SimConfig,
    pub particles: Vec<Particle>,
    clusters: ClusterSet,
    forces: ForceModel,
    integrator: Integrator,
    step_count: u64,
    energy_log: Vec<EnergySample>,
    totals: PairStats,
    phase: Phase,
    rng: R,
}

impl Simulation<StdRng> {
    /// Create a simulation from a configuration.
    ///
    /// Particles are placed by rejection sampling so that no two shells overlap. Initial
    /// velocity components are uniform in `[-velocity_range, velocity_range]`. A `seed` makes
    /// the run reproducible; `None` draws one from the thread RNG.
    pub fn new(config: SimConfig, seed: Option<u64>) -> Result<Self> {
        let seed = seed.unwrap_or_else(|| rng().random());
        log::info!("rng seed {seed}");
        let seeded: StdRng = SeedableRng::seed_from_u64(seed);
        Self::with_rng(config, seeded)
    }
}

impl<R: Rng> Simulation<R> {
    /// Like [`Simulation::new`] but with a caller-supplied source of randomness.
    pub fn with_rng(config: SimConfig, mut rng: R) -> Result<Self> {
        config.validate()?;
        let particles = place_particles(&config, &mut rng)?;
        log::info!(
            "placed {} particles in a box of size {}",
            particles.len(),
            config.system.box_size
        );
        Ok(Self::assemble(config, particles, rng))
    }

    /// Start from explicit particles instead of random placement.
    ///
    /// `particles.len()` must equal `system.num_particles`, every particle must carry the
    /// configured radii and sit within the wall contact limit. Ids are renumbered to match
    /// their index.
    pub fn from_particles(config: SimConfig, mut particles: Vec<Particle>, rng: R) -> Result<Self> {
        config.validate()?;
        if particles.len() != config.system.num_particles {
            return Err(Error::config(format!(
                "expected {} particles, got {}",
                config.system.num_particles,
                particles.len()
            )));
        }
        let sys = &config.system;
        let limit = config.half_box() - config.wall_radius();
        for (i, p) in particles.iter_mut().enumerate() {
            if p.radius != sys.core_radius || p.shell_radius != sys.shell_radius {
                return Err(Error::config(format!(
                    "particle {i} has radii ({}, {}) but the system uses ({}, {})",
                    p.radius, p.shell_radius, sys.core_radius, sys.shell_radius
                )));
            }
            if p.r.iter().any(|x| x.abs() > limit) {
                return Err(Error::config(format!(
                    "particle {i} at {:?} lies outside ±{limit}",
                    p.r
                )));
            }
            p.id = i as u32;
        }
        Ok(Self::assemble(config, particles, rng))
    }

    fn assemble(config: SimConfig, particles: Vec<Particle>, rng: R) -> Self {
        let n = particles.len();
        Self {
            forces: ForceModel::new(&config),
            integrator: Integrator::new(&config.integrator, config.run.dt),
            clusters: ClusterSet::new(n),
            particles,
            step_count: 0,
            energy_log: Vec::new(),
            totals: PairStats::default(),
            phase: Phase::Stepping,
            rng,
            config,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Steps completed so far.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Number of particles.
    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    /// True once the configured number of steps has run.
    pub fn is_finished(&self) -> bool {
        self.step_count >= self.config.run.num_steps
    }

    /// Positions as a Vec of fixed-size arrays.
    pub fn positions(&self) -> Vec<[f64; DIM]> {
        self.particles.iter().map(|p| p.r).collect()
    }

    /// Velocities as a Vec of fixed-size arrays.
    pub fn velocities(&self) -> Vec<[f64; DIM]> {
        self.particles.iter().map(|p| p.v).collect()
    }

    pub fn clusters(&self) -> &ClusterSet {
        &self.clusters
    }

    /// One entry per tracked step.
    pub fn energy_log(&self) -> &[EnergySample] {
        &self.energy_log
    }

    /// Cumulative pair-resolution counters.
    pub fn collision_totals(&self) -> PairStats {
        self.totals
    }

    /// Compute total kinetic energy (diagnostic).
    pub fn kinetic_energy(&self) -> f64 {
        self.particles.iter().map(|p| p.kinetic_energy()).sum()
    }

    /// Potential energy with the confinement strength of the next step.
    pub fn potential_energy(&self) -> f64 {
        let release = self.forces.release_factor(self.step_count);
        self.forces.potential_energy(&self.particles, release)
    }

    /// Advance exactly one step.
    ///
    /// Errors with `Error::Finished` once the step budget is used up.
    pub fn step(&mut self) -> Result<()> {
        if self.is_finished() {
            return Err(Error::Finished(self.step_count));
        }
        let release = self.forces.release_factor(self.step_count);

        let stats = collision::resolve_pairs(
            &mut self.particles,
            &mut self.clusters,
            &self.config.collisions,
            &mut self.rng,
        );
        self.totals.hard_core += stats.hard_core;
        self.totals.merges += stats.merges;
        if stats != PairStats::default() {
            log::debug!(
                "step {}: {} hard-core hits, {} merges",
                self.step_count,
                stats.hard_core,
                stats.merges
            );
        }

        let pair_forces = self.forces.pair_forces(&self.particles);
        let half = self.config.half_box();
        let wall_radius = self.config.wall_radius();
        for (p, f_pair) in self.particles.iter_mut().zip(pair_forces) {
            let f = vector::add(self.forces.external_force(p.r, release), f_pair);
            let accel = vector::scale(f, 1.0 / p.mass);
            let kick: Vec3 = self
                .forces
                .rebel_kick(&mut self.rng, p.mass)
                .unwrap_or(vector::ZERO);
            self.integrator.advance(p, accel, kick);
            collision::resolve_wall(p, half, wall_radius);
        }

        if self.config.run.track_energy {
            let potential = self.forces.potential_energy(&self.particles, release);
            self.energy_log
                .push(EnergySample::new(self.kinetic_energy(), potential));
        }

        self.step_count += 1;
        if self.is_finished() {
            self.phase = Phase::Done;
        }
        Ok(())
    }

    /// Run up to `n` steps, stopping early at the step budget. Returns the steps taken.
    pub fn advance(&mut self, n: u64) -> Result<u64> {
        let mut taken = 0;
        while taken < n && !self.is_finished() {
            self.step()?;
            taken += 1;
        }
        Ok(taken)
    }

    /// Run the remaining steps, feeding `sink` every frame and writing snapshots through
    /// `exporter` at the configured interval and at the end.
    ///
    /// With `output.continue_on_error` a failed snapshot is logged and counted; otherwise the
    /// error is returned and the simulation stays where it stopped.
    pub fn run(
        &mut self,
        sink: &mut dyn FrameSink,
        exporter: Option<&SnapshotWriter>,
    ) -> Result<RunSummary> {
        let start = self.step_count;
        let before = self.totals;
        let mut summary = RunSummary::default();
        log::info!(
            "running steps {}..{} (dt = {})",
            start,
            self.config.run.num_steps,
            self.config.run.dt
        );

        sink.setup(&self.scene());
        let mut bodies = Vec::with_capacity(self.particles.len());
        while !self.is_finished() {
            self.step()?;
            self.fill_bodies(&mut bodies);
            sink.frame(self.step_count, &bodies);

            if let (Some(w), Some(every)) = (exporter, self.config.output.interval) {
                if self.step_count % every == 0 {
                    let path = w.interval_path(self.step_count);
                    self.export(w, path, &mut summary)?;
                }
            }
            sink.pace();
        }

        if let Some(w) = exporter.filter(|_| self.config.output.write_final) {
            let path = w.final_path(&self.config.system.label, self.particles.len());
            self.export(w, path, &mut summary)?;
        }
        self.phase = Phase::Done;

        summary.steps = self.step_count - start;
        summary.hard_core_collisions = self.totals.hard_core - before.hard_core;
        summary.merges = self.totals.merges - before.merges;
        summary.final_energy = Some(self.energy());
        log::info!(
            "run finished: {} steps, {} snapshots, {} clusters",
            summary.steps,
            summary.snapshots.len(),
            self.clusters.num_multi()
        );
        Ok(summary)
    }

    /// Current kinetic, potential and total energy.
    pub fn energy(&self) -> EnergySample {
        EnergySample::new(self.kinetic_energy(), self.potential_energy())
    }

    /// Scene description for visualization.
    pub fn scene(&self) -> Scene {
        let conf = &self.config.forces.confinement;
        Scene {
            box_size: self.config.system.box_size,
            confinement_radius: conf.enabled.then_some(conf.radius),
            num_particles: self.particles.len(),
        }
    }

    /// Render proxies for every particle.
    pub fn bodies(&self) -> Vec<BodyView> {
        let mut out = Vec::with_capacity(self.particles.len());
        self.fill_bodies(&mut out);
        out
    }

    fn fill_bodies(&self, out: &mut Vec<BodyView>) {
        out.clear();
        out.extend(self.particles.iter().enumerate().map(|(i, p)| BodyView {
            position: p.r,
            core_radius: p.radius,
            shell_radius: p.shell_radius,
            cluster: self.clusters.cluster_of(i),
        }));
    }

    /// Records for the XYZ serializer, all tagged with `label`.
    pub fn xyz_records(&self, label: &str) -> Vec<XyzRecord> {
        self.particles
            .iter()
            .map(|p| XyzRecord {
                label: label.to_string(),
                pos: p.r,
            })
            .collect()
    }

    /// Informational comment line for snapshots.
    pub fn snapshot_comment(&self) -> String {
        let s = &self.config.system;
        format!(
            "mdsim step {} | core_radius={} | shell_radius={} | mass={}",
            self.step_count, s.core_radius, s.shell_radius, s.mass
        )
    }

    fn export(
        &mut self,
        writer: &SnapshotWriter,
        path: PathBuf,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let resume = self.phase;
        self.phase = Phase::Exporting;
        let records = self.xyz_records(&self.config.system.label);
        let result = writer.write(&path, &records, &self.snapshot_comment());
        self.phase = resume;
        match result {
            Ok(()) => {
                log::debug!("snapshot at step {} -> {}", self.step_count, path.display());
                summary.snapshots.push(path);
                Ok(())
            }
            Err(e) if self.config.output.continue_on_error => {
                log::warn!("{e}; continuing");
                summary.export_failures += 1;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Rejection-sample positions so that no two shells overlap and every particle clears the
/// walls, then draw velocities.
fn place_particles<R: Rng>(config: &SimConfig, rng: &mut R) -> Result<Vec<Particle>> {
    let s = &config.system;
    let limit = config.half_box() - config.wall_radius();
    let min_sep = 2.0 * s.shell_radius;
    let max_attempts = config.init.max_attempts;
    let vr = config.init.velocity_range;

    let mut particles: Vec<Particle> = Vec::with_capacity(s.num_particles);
    for id in 0..(s.num_particles as u32) {
        let mut attempts = 0usize;
        let r = loop {
            if attempts >= max_attempts {
                return Err(Error::Initialization(format!(
                    "failed to place particle {} after {} attempts; try fewer particles, a larger box or a smaller shell_radius",
                    id, max_attempts
                )));
            }
            attempts += 1;
            let mut r = [0.0_f64; DIM];
            for r_k in r.iter_mut() {
                *r_k = rng.random_range(-limit..=limit);
            }
            if !overlaps_existing(&particles, &r, min_sep) {
                break r;
            }
        };

        let mut v = [0.0_f64; DIM];
        v.iter_mut().for_each(|x| *x = rng.random_range(-vr..=vr));

        particles.push(Particle::new(
            id,
            r,
            v,
            s.core_radius,
            s.shell_radius,
            config.mass_of(id as usize),
        )?);
    }
    Ok(particles)
}

fn overlaps_existing(existing: &[Particle], r: &[f64; DIM], min_sep: f64) -> bool {
    let min_sq = min_sep * min_sep;
    existing.iter().any(|p| {
        let d = vector::sub(*r, p.r);
        vector::dot(d, d) < min_sq
    })
}
