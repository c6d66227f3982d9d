//! Force terms acting on the particles.
//!
//! Every term is independent and can be switched off through its constant
//! (or the `enabled` flag for confinement). Forces are returned as forces;
//! the caller divides by mass.

use rand::Rng;
use rand_distr::{Distribution, UnitSphere};

use crate::config::{ForceConfig, SimConfig};
use crate::core::particle::Particle;
use crate::core::vector::{self, Vec3, ZERO};

/// Floor on the centre distance for the inverse-square term.
const MIN_CENTRE_DIST: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct ForceModel {
    cfg: ForceConfig,
    num_steps: u64,
    release_fraction: f64,
}

impl ForceModel {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            cfg: config.forces.clone(),
            num_steps: config.run.num_steps,
            release_fraction: config.run.release_fraction,
        }
    }

    /// Confinement strength at `step`: 1 for most of the run, then a linear
    /// ramp down to 0 over the final `release_fraction` of the steps.
    pub fn release_factor(&self, step: u64) -> f64 {
        release_factor(step, self.num_steps, self.release_fraction)
    }

    /// Sum of the single-particle terms at position `r`.
    pub fn external_force(&self, r: Vec3, release: f64) -> Vec3 {
        let d = vector::magnitude(r);
        let mut f = ZERO;

        let conf = &self.cfg.confinement;
        if conf.enabled {
            if d < conf.radius {
                f = vector::add(f, vector::scale(r, conf.k_repulsion * release));
            } else if conf.k_restoring != 0.0 {
                let pull = -conf.k_restoring * (d - conf.radius);
                f = vector::add(f, vector::scale(vector::norm(r), pull));
            }
        }

        if self.cfg.k_global != 0.0 {
            f = vector::add(f, vector::scale(r, -self.cfg.k_global));
        }

        if self.cfg.k_inverse_square != 0.0 {
            let d = d.max(MIN_CENTRE_DIST);
            let push = self.cfg.k_inverse_square / (d * d);
            f = vector::add(f, vector::scale(vector::norm(r), push));
        }

        f
    }

    /// Shell-overlap forces for every unordered pair, one entry per particle.
    ///
    /// A pair contributes while its shells overlap and its cores do not touch.
    /// The force on `i` is `k_pair * overlap` along the direction to `j`, and the
    /// opposite force acts on `j`.
    pub fn pair_forces(&self, particles: &[Particle]) -> Vec<Vec3> {
        let n = particles.len();
        let mut out = vec![ZERO; n];
        if self.cfg.k_pair == 0.0 {
            return out;
        }
        for i in 0..n {
            for j in (i + 1)..n {
                let (pi, pj) = (&particles[i], &particles[j]);
                let Some(overlap) = shell_overlap(pi, pj) else {
                    continue;
                };
                let dir = vector::norm(vector::sub(pj.r, pi.r));
                let f = vector::scale(dir, self.cfg.k_pair * overlap);
                out[i] = vector::add(out[i], f);
                out[j] = vector::sub(out[j], f);
            }
        }
        out
    }

    /// Occasional random velocity kick ("rebel" impulse).
    ///
    /// With probability `rebel.probability` returns a velocity change of
    /// `rebel.magnitude / mass` in a direction drawn uniformly from the unit sphere.
    pub fn rebel_kick<R: Rng>(&self, rng: &mut R, mass: f64) -> Option<Vec3> {
        let rebel = &self.cfg.rebel;
        if rebel.probability <= 0.0 || rng.random::<f64>() >= rebel.probability {
            return None;
        }
        let dir: Vec3 = UnitSphere.sample(rng);
        Some(vector::scale(dir, rebel.magnitude / mass))
    }

    /// Potential energy matching the forces above.
    pub fn potential_energy(&self, particles: &[Particle], release: f64) -> f64 {
        let conf = &self.cfg.confinement;
        let mut e = 0.0;
        for p in particles {
            let d = vector::magnitude(p.r);
            if conf.enabled {
                if d < conf.radius {
                    e += 0.5 * conf.k_repulsion * release * (conf.radius * conf.radius - d * d);
                } else {
                    let s = d - conf.radius;
                    e += 0.5 * conf.k_restoring * s * s;
                }
            }
            e += 0.5 * self.cfg.k_global * d * d;
            if self.cfg.k_inverse_square != 0.0 {
                e += self.cfg.k_inverse_square / d.max(MIN_CENTRE_DIST);
            }
        }
        if self.cfg.k_pair != 0.0 {
            for (i, pi) in particles.iter().enumerate() {
                for pj in &particles[i + 1..] {
                    if let Some(overlap) = shell_overlap(pi, pj) {
                        e -= 0.5 * self.cfg.k_pair * overlap * overlap;
                    }
                }
            }
        }
        e
    }
}

/// Free-function form of [`ForceModel::release_factor`].
pub fn release_factor(step: u64, num_steps: u64, release_fraction: f64) -> f64 {
    let n = num_steps as f64;
    let window = release_fraction * n;
    let s = step as f64;
    if window <= 0.0 || s < n - window {
        return 1.0;
    }
    ((n - s) / window).clamp(0.0, 1.0)
}

/// Shell overlap of a pair whose shells intersect but whose cores are apart.
fn shell_overlap(a: &Particle, b: &Particle) -> Option<f64> {
    let dist = vector::magnitude(vector::sub(b.r, a.r));
    let contact = a.radius + b.radius;
    let shell = a.shell_radius + b.shell_radius;
    if dist < shell && dist >= contact {
        Some(shell - dist)
    } else {
        None
    }
}
