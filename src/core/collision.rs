//! Particle-particle and particle-wall collision handling.
//!
//! Pairs are visited once each (`i < j`) per step. Two tiers apply to a pair:
//! hard-core contact (elastic bounce, positional separation, cluster
//! dissolution) and, failing that, soft-shell proximity (probabilistic merge
//! of the two clusters).

use rand::Rng;

use crate::config::CollisionConfig;
use crate::core::cluster::ClusterSet;
use crate::core::particle::{Particle, DIM};
use crate::core::vector::{self, Vec3, ZERO};

/// Separation direction used when two centres coincide exactly.
const FALLBACK_NORMAL: Vec3 = [1.0, 0.0, 0.0];

/// Upper bound on position-only relaxation sweeps per call to [`resolve_pairs`].
pub const MAX_RELAX_SWEEPS: usize = 256;

/// Residual core overlap accepted once relaxation stops.
pub const OVERLAP_TOLERANCE: f64 = 1e-7;

/// Counters for one pass over all pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairStats {
    pub hard_core: usize,
    pub merges: usize,
}

/// Post-collision velocities for a contact with unit normal `n` pointing from `i` to `j`.
///
/// Only the normal components change; tangential components are untouched. The exchanged
/// impulse is scaled by `(1 + restitution) / 2`, so `restitution = 1` is perfectly elastic
/// and, for equal masses, swaps the normal components. Pairs that are not approaching
/// along `n` (including a zero normal) are returned unchanged.
pub fn elastic_exchange(
    vi: Vec3,
    vj: Vec3,
    mi: f64,
    mj: f64,
    n: Vec3,
    restitution: f64,
) -> (Vec3, Vec3) {
    let u_n = vector::dot(vector::sub(vj, vi), n);
    if u_n >= 0.0 {
        return (vi, vj);
    }
    let fi = ((1.0 + restitution) * mj / (mi + mj)) * u_n;
    let fj = ((1.0 + restitution) * mi / (mi + mj)) * u_n;
    (
        vector::add(vi, vector::scale(n, fi)),
        vector::sub(vj, vector::scale(n, fj)),
    )
}

/// Resolve a hard-core overlap between `a` and `b`.
///
/// Returns `false` (and changes nothing) when the cores do not overlap. Otherwise the normal
/// velocities are exchanged and each particle is pushed back by half the overlap along the
/// line of centres, leaving the pair exactly in contact.
pub fn resolve_hard_core(a: &mut Particle, b: &mut Particle, restitution: f64) -> bool {
    let (n, overlap) = core_overlap(a, b);
    if overlap <= 0.0 {
        return false;
    }

    let (va, vb) = elastic_exchange(a.v, b.v, a.mass, b.mass, n, restitution);
    a.v = va;
    b.v = vb;
    push_apart(a, b, n, overlap);
    true
}

/// Push overlapping cores apart without touching velocities, sweeping every pair until no
/// overlap above [`OVERLAP_TOLERANCE`] remains or [`MAX_RELAX_SWEEPS`] is reached.
///
/// Returns whether the particles ended overlap-free.
pub fn relax_overlaps(particles: &mut [Particle]) -> bool {
    let n = particles.len();
    for _ in 0..MAX_RELAX_SWEEPS {
        let mut moved = false;
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = pair_mut(particles, i, j);
                let (normal, overlap) = core_overlap(a, b);
                if overlap > OVERLAP_TOLERANCE {
                    push_apart(a, b, normal, overlap);
                    moved = true;
                }
            }
        }
        if !moved {
            return true;
        }
    }
    false
}

/// Unit normal from `a` to `b` and how far the cores interpenetrate (negative when apart).
fn core_overlap(a: &Particle, b: &Particle) -> (Vec3, f64) {
    let r_vec = vector::sub(b.r, a.r);
    let overlap = a.radius + b.radius - vector::magnitude(r_vec);
    let mut n = vector::norm(r_vec);
    if n == ZERO {
        n = FALLBACK_NORMAL;
    }
    (n, overlap)
}

/// Move each particle back by half the overlap along the line of centres.
fn push_apart(a: &mut Particle, b: &mut Particle, n: Vec3, overlap: f64) {
    let half = 0.5 * overlap;
    a.r = vector::sub(a.r, vector::scale(n, half));
    b.r = vector::add(b.r, vector::scale(n, half));
}

/// True when the pair sits in the sticking band: cores clear of contact by more than
/// `epsilon`, shells overlapping.
pub fn in_stick_band(a: &Particle, b: &Particle, epsilon: f64) -> bool {
    let dist = vector::magnitude(vector::sub(b.r, a.r));
    let lo = a.radius + b.radius + epsilon;
    let hi = a.shell_radius + b.shell_radius;
    lo < dist && dist < hi
}

/// One pass of pair resolution over every unordered pair.
///
/// A hard-core hit always dissolves both particles' clusters. Otherwise a pair in the
/// sticking band that is not already clustered merges with probability
/// `stick_probability`. Separating one pair can push a neighbour into contact, so after
/// any hit the cores are relaxed apart (positions only; each pair exchanges velocities at
/// most once per call).
pub fn resolve_pairs<R: Rng>(
    particles: &mut [Particle],
    clusters: &mut ClusterSet,
    cfg: &CollisionConfig,
    rng: &mut R,
) -> PairStats {
    let mut stats = PairStats::default();
    let n = particles.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = pair_mut(particles, i, j);
            if resolve_hard_core(a, b, cfg.restitution) {
                clusters.dissolve(i);
                clusters.dissolve(j);
                stats.hard_core += 1;
                continue;
            }
            if cfg.stick_probability > 0.0
                && in_stick_band(a, b, cfg.stick_epsilon)
                && !clusters.same_cluster(i, j)
                && rng.random::<f64>() < cfg.stick_probability
                && clusters.merge(i, j)
            {
                stats.merges += 1;
            }
        }
    }
    if stats.hard_core > 0 && !relax_overlaps(particles) {
        log::debug!("core overlaps remain after {MAX_RELAX_SWEEPS} relaxation sweeps");
    }
    stats
}

/// Reflect `p` off the walls of a box spanning `[-half, half]` on every axis.
///
/// Each axis is handled independently: if the centre is farther out than `half - contact`,
/// it is clamped onto that plane and the velocity component is negated. Returns whether any
/// axis was reflected.
pub fn resolve_wall(p: &mut Particle, half: f64, contact: f64) -> bool {
    let limit = half - contact;
    let mut hit = false;
    for k in 0..DIM {
        if p.r[k] > limit {
            p.r[k] = limit;
            p.v[k] = -p.v[k];
            hit = true;
        } else if p.r[k] < -limit {
            p.r[k] = -limit;
            p.v[k] = -p.v[k];
            hit = true;
        }
    }
    hit
}

/// Two distinct mutable elements of a slice, `i < j`.
fn pair_mut<T>(s: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert!(i < j);
    let (lo, hi) = s.split_at_mut(j);
    (&mut lo[i], &mut hi[0])
}
