use crate::core::vector::{self, Vec3};
use crate::error::{Error, Result};

/// Fixed spatial dimension (3D).
pub const DIM: usize = 3;

/// A simulated atom: a hard core surrounded by a larger soft shell.
///
/// Fields:
/// - `id`: stable index into the particle set
/// - `r`: position vector [x, y, z], box centred on the origin
/// - `v`: velocity vector [vx, vy, vz]
/// - `radius`: hard-core radius (> 0), used for contact collisions
/// - `shell_radius`: soft-shell radius (>= `radius`), used for clustering and pair forces
/// - `mass`: particle mass (> 0)
///
/// Cluster membership lives in [`crate::core::ClusterSet`], not on the particle.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Stable particle identifier.
    pub id: u32,
    /// Position (x, y, z).
    pub r: Vec3,
    /// Velocity (vx, vy, vz).
    pub v: Vec3,
    /// Hard-core radius (> 0).
    pub radius: f64,
    /// Soft-shell radius (>= radius).
    pub shell_radius: f64,
    /// Mass (> 0).
    pub mass: f64,
}

impl Particle {
    /// Create a new particle after validating invariants.
    ///
    /// Errors:
    /// - `Error::Config` if `radius` or `mass` is non-positive, the shell is smaller than the
    ///   core, or any component is NaN/inf.
    pub fn new(
        id: u32,
        r: Vec3,
        v: Vec3,
        radius: f64,
        shell_radius: f64,
        mass: f64,
    ) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::config("radius must be finite and > 0"));
        }
        if !shell_radius.is_finite() || shell_radius < radius {
            return Err(Error::config("shell_radius must be finite and >= radius"));
        }
        if !mass.is_finite() || mass <= 0.0 {
            return Err(Error::config("mass must be finite and > 0"));
        }
        if !vector::is_finite(r) {
            return Err(Error::config("position must be finite"));
        }
        if !vector::is_finite(v) {
            return Err(Error::config("velocity must be finite"));
        }
        Ok(Self {
            id,
            r,
            v,
            radius,
            shell_radius,
            mass,
        })
    }

    /// Returns the particle's kinetic energy: 1/2 m |v|^2.
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * vector::dot(self.v, self.v)
    }

    /// Speed |v|.
    #[inline]
    pub fn speed(&self) -> f64 {
        vector::magnitude(self.v)
    }

    /// Set position (validated as finite).
    pub fn set_position(&mut self, r: Vec3) -> Result<()> {
        if !vector::is_finite(r) {
            return Err(Error::config("position must be finite"));
        }
        self.r = r;
        Ok(())
    }

    /// Set velocity (validated as finite).
    pub fn set_velocity(&mut self, v: Vec3) -> Result<()> {
        if !vector::is_finite(v) {
            return Err(Error::config("velocity must be finite"));
        }
        self.v = v;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_particle_ok() -> Result<()> {
        let p = Particle::new(1, [0.0, 1.0, 2.0], [2.0, -3.0, 0.5], 0.5, 1.2, 2.0)?;
        assert_eq!(p.id, 1);
        assert_eq!(p.r, [0.0, 1.0, 2.0]);
        assert_eq!(p.v, [2.0, -3.0, 0.5]);
        assert_eq!(p.radius, 0.5);
        assert_eq!(p.shell_radius, 1.2);
        assert_eq!(p.mass, 2.0);
        Ok(())
    }

    #[test]
    fn invalid_radius_rejected() {
        let err = Particle::new(0, [0.0; 3], [0.0; 3], 0.0, 1.0, 1.0).unwrap_err();
        assert!(err.to_string().contains("radius"));
    }

    #[test]
    fn shell_smaller_than_core_rejected() {
        let err = Particle::new(0, [0.0; 3], [0.0; 3], 1.0, 0.5, 1.0).unwrap_err();
        assert!(err.to_string().contains("shell_radius"));
    }

    #[test]
    fn invalid_mass_rejected() {
        let err = Particle::new(0, [0.0; 3], [0.0; 3], 1.0, 1.0, 0.0).unwrap_err();
        assert!(err.to_string().contains("mass"));
    }

    #[test]
    fn non_finite_velocity_rejected() -> Result<()> {
        let mut p = Particle::new(0, [0.0; 3], [0.0; 3], 1.0, 1.0, 1.0)?;
        assert!(p.set_velocity([f64::NAN, 0.0, 0.0]).is_err());
        assert_eq!(p.v, [0.0; 3]);
        Ok(())
    }

    #[test]
    fn kinetic_energy_computed() -> Result<()> {
        // v = (3,4,0), |v|^2 = 25; KE = 0.5 * m * 25
        let p = Particle::new(7, [0.0; 3], [3.0, 4.0, 0.0], 1.0, 1.0, 2.0)?;
        assert!((p.kinetic_energy() - 25.0).abs() < 1e-12);
        assert!((p.speed() - 5.0).abs() < 1e-12);
        Ok(())
    }
}
