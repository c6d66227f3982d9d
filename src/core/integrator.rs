use crate::config::{IntegratorConfig, IntegratorMode};
use crate::core::particle::Particle;
use crate::core::vector::{self, Vec3, ZERO};

/// Fixed-step explicit integrator.
///
/// Velocity is updated first from the acceleration at the old position, then
/// damped, kicked by any external impulse, optionally floored to zero, and
/// finally used to move the particle.
#[derive(Debug, Clone, Copy)]
pub struct Integrator {
    pub mode: IntegratorMode,
    pub dt: f64,
    pub damping: f64,
    pub velocity_cutoff: f64,
}

impl Integrator {
    pub fn new(cfg: &IntegratorConfig, dt: f64) -> Self {
        Self {
            mode: cfg.mode,
            dt,
            damping: cfg.damping,
            velocity_cutoff: cfg.velocity_cutoff,
        }
    }

    /// `v = (v + a dt) * damping + dv`, then the speed floor.
    pub fn kick(&self, p: &mut Particle, accel: Vec3, dv: Vec3) {
        p.v = vector::add(p.v, vector::scale(accel, self.dt));
        p.v = vector::scale(p.v, self.damping);
        p.v = vector::add(p.v, dv);
        if self.velocity_cutoff > 0.0 && p.speed() < self.velocity_cutoff {
            p.v = ZERO;
        }
    }

    /// Move the particle with its (already updated) velocity.
    pub fn drift(&self, p: &mut Particle, accel: Vec3) {
        let mut dx = vector::scale(p.v, self.dt);
        if self.mode == IntegratorMode::SecondOrder {
            dx = vector::add(dx, vector::scale(accel, 0.5 * self.dt * self.dt));
        }
        p.r = vector::add(p.r, dx);
    }

    /// One full update: [`kick`](Self::kick) then [`drift`](Self::drift).
    pub fn advance(&self, p: &mut Particle, accel: Vec3, dv: Vec3) {
        self.kick(p, accel, dv);
        self.drift(p, accel);
    }
}
