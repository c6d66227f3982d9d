//! Simulation configuration.
//!
//! One [`SimConfig`] is built at startup (defaults, TOML file, or both) and
//! handed to the simulation; nothing reads ambient globals. Every section uses
//! `#[serde(default)]` so a TOML file only needs the values it changes.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, SQRT_2};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub system: SystemConfig,
    pub run: RunConfig,
    pub forces: ForceConfig,
    pub collisions: CollisionConfig,
    pub integrator: IntegratorConfig,
    pub init: InitConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub num_particles: usize,
    /// Full edge length of the cubic box, centred on the origin.
    pub box_size: f64,
    pub core_radius: f64,
    pub shell_radius: f64,
    /// Mass shared by every particle unless `masses` is given.
    pub mass: f64,
    /// Optional per-particle masses; length must equal `num_particles`.
    pub masses: Option<Vec<f64>>,
    /// Element symbol written to snapshots.
    pub label: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            num_particles: 6,
            box_size: 20.0,
            core_radius: 1.75,
            shell_radius: 1.9,
            mass: 112.0,
            masses: None,
            label: "Cd".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub dt: f64,
    pub num_steps: u64,
    pub track_energy: bool,
    /// Final fraction of the run over which confinement is ramped down to zero.
    pub release_fraction: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dt: 0.06,
            num_steps: 3000,
            track_energy: true,
            release_fraction: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    pub confinement: ConfinementConfig,
    /// Harmonic spring toward the origin.
    pub k_global: f64,
    /// Outward `k / d^2` push from the origin.
    pub k_inverse_square: f64,
    /// Shell-overlap pair force; positive attracts, negative repels.
    pub k_pair: f64,
    pub rebel: RebelConfig,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            confinement: ConfinementConfig::default(),
            k_global: 11.2,
            k_inverse_square: 0.0,
            k_pair: 0.0,
            rebel: RebelConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfinementConfig {
    pub enabled: bool,
    /// Inner sphere radius R1.
    pub radius: f64,
    /// Outward push inside R1, proportional to distance from the centre.
    pub k_repulsion: f64,
    /// Pull back toward R1 when outside it, proportional to `d - R1`.
    pub k_restoring: f64,
}

impl Default for ConfinementConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 8.0,
            k_repulsion: 3.0,
            k_restoring: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebelConfig {
    /// Per-particle, per-step chance of a kick.
    pub probability: f64,
    /// Impulse magnitude; the velocity change is `magnitude / mass`.
    pub magnitude: f64,
}

impl Default for RebelConfig {
    fn default() -> Self {
        Self {
            probability: 0.02,
            magnitude: 22.4,
        }
    }
}

/// Radius used against the box walls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallContact {
    Core,
    Shell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Chance per step that a qualifying shell-overlapping pair sticks.
    pub stick_probability: f64,
    /// Gap above core contact below which no sticking happens.
    pub stick_epsilon: f64,
    /// Coefficient of restitution for hard-core collisions (1 = elastic).
    pub restitution: f64,
    pub wall_contact: WallContact,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            stick_probability: 0.2,
            stick_epsilon: 0.05,
            restitution: 1.0,
            wall_contact: WallContact::Shell,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorMode {
    /// `v += a dt; v *= damping; x += v dt`
    SemiImplicitEuler,
    /// As above plus `x += a dt^2 / 2`.
    SecondOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorConfig {
    pub mode: IntegratorMode,
    /// Velocity multiplier applied every step.
    pub damping: f64,
    /// Speeds below this are zeroed. 0 never triggers.
    pub velocity_cutoff: f64,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            mode: IntegratorMode::SemiImplicitEuler,
            damping: 0.96,
            velocity_cutoff: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitConfig {
    /// Initial velocity components are uniform in `[-velocity_range, velocity_range]`.
    pub velocity_range: f64,
    /// Placement attempts per particle before giving up.
    pub max_attempts: usize,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            velocity_range: 1.0,
            max_attempts: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// File name prefix for snapshots.
    pub stem: String,
    /// Write a snapshot every `interval` steps.
    pub interval: Option<u64>,
    /// Write a snapshot when the run finishes.
    pub write_final: bool,
    /// Decimal digits per coordinate.
    pub precision: usize,
    /// Log and count snapshot failures instead of aborting the run.
    pub continue_on_error: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            stem: "config".to_string(),
            interval: None,
            write_final: true,
            precision: 4,
            continue_on_error: false,
        }
    }
}

/// Densest packing fraction of equal spheres.
pub const CLOSE_PACKING_FRACTION: f64 = PI / (3.0 * SQRT_2);

/// Largest supported coordinate precision.
pub const MAX_PRECISION: usize = 12;

impl SimConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: SimConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Half the box edge.
    #[inline]
    pub fn half_box(&self) -> f64 {
        0.5 * self.system.box_size
    }

    /// Radius kept clear of the walls.
    #[inline]
    pub fn wall_radius(&self) -> f64 {
        match self.collisions.wall_contact {
            WallContact::Core => self.system.core_radius,
            WallContact::Shell => self.system.shell_radius,
        }
    }

    /// Mass of particle `i`.
    pub fn mass_of(&self, i: usize) -> f64 {
        match &self.system.masses {
            Some(m) => m.get(i).copied().unwrap_or(self.system.mass),
            None => self.system.mass,
        }
    }

    /// Upper bound on how many shells fit in the box without overlapping.
    ///
    /// Shells live in a cube of edge `box_size - 2 * wall_radius + 2 * shell_radius`; no packing
    /// of equal spheres fills more than `pi / sqrt(18)` of a volume, so N above this cannot be
    /// placed. Never below the simple cubic lattice count, which is always achievable. Reaching
    /// the bound is not guaranteed: random placement may still fail with
    /// [`Error::Initialization`] before it.
    pub fn packing_capacity(&self) -> usize {
        let avail = self.system.box_size - 2.0 * self.wall_radius();
        if avail < 0.0 {
            return 0;
        }
        let shell = self.system.shell_radius;
        let per_axis = (avail / (2.0 * shell)).floor() as usize + 1;
        let lattice = per_axis.saturating_mul(per_axis).saturating_mul(per_axis);
        let sphere = 4.0 / 3.0 * PI * shell.powi(3);
        let dense = CLOSE_PACKING_FRACTION * (avail + 2.0 * shell).powi(3) / sphere;
        // Float to int casts saturate.
        lattice.max(dense.floor() as usize)
    }

    /// Check every value and combination of values.
    pub fn validate(&self) -> Result<()> {
        let s = &self.system;
        if s.num_particles == 0 {
            return Err(Error::config("num_particles must be > 0"));
        }
        if u32::try_from(s.num_particles).is_err() {
            return Err(Error::config("num_particles does not fit in u32"));
        }
        positive("box_size", s.box_size)?;
        positive("core_radius", s.core_radius)?;
        positive("mass", s.mass)?;
        if !s.shell_radius.is_finite() || s.shell_radius < s.core_radius {
            return Err(Error::config("shell_radius must be finite and >= core_radius"));
        }
        if let Some(masses) = &s.masses {
            if masses.len() != s.num_particles {
                return Err(Error::config(format!(
                    "masses has {} entries but num_particles is {}",
                    masses.len(),
                    s.num_particles
                )));
            }
            for m in masses {
                positive("masses[i]", *m)?;
            }
        }
        if s.label.is_empty() || s.label.chars().any(char::is_whitespace) {
            return Err(Error::config("label must be a non-empty token without whitespace"));
        }
        if s.box_size <= 2.0 * self.wall_radius() {
            return Err(Error::config("box_size must exceed twice the wall contact radius"));
        }
        let capacity = self.packing_capacity();
        if s.num_particles > capacity {
            return Err(Error::config(format!(
                "{} particles cannot be packed with shell_radius {} in a box of size {} (capacity {})",
                s.num_particles, s.shell_radius, s.box_size, capacity
            )));
        }

        let r = &self.run;
        positive("dt", r.dt)?;
        if r.num_steps == 0 {
            return Err(Error::config("num_steps must be > 0"));
        }
        unit_interval("release_fraction", r.release_fraction)?;

        let f = &self.forces;
        finite("k_global", f.k_global)?;
        finite("k_inverse_square", f.k_inverse_square)?;
        finite("k_pair", f.k_pair)?;
        if f.confinement.enabled {
            positive("confinement.radius", f.confinement.radius)?;
            finite("confinement.k_repulsion", f.confinement.k_repulsion)?;
            finite("confinement.k_restoring", f.confinement.k_restoring)?;
        }
        unit_interval("rebel.probability", f.rebel.probability)?;
        non_negative("rebel.magnitude", f.rebel.magnitude)?;

        let c = &self.collisions;
        unit_interval("stick_probability", c.stick_probability)?;
        non_negative("stick_epsilon", c.stick_epsilon)?;
        unit_interval("restitution", c.restitution)?;

        let i = &self.integrator;
        if !i.damping.is_finite() || i.damping <= 0.0 || i.damping > 1.0 {
            return Err(Error::config("damping must be in (0, 1]"));
        }
        non_negative("velocity_cutoff", i.velocity_cutoff)?;

        non_negative("velocity_range", self.init.velocity_range)?;
        if self.init.max_attempts == 0 {
            return Err(Error::config("max_attempts must be > 0"));
        }

        let o = &self.output;
        if o.precision == 0 || o.precision > MAX_PRECISION {
            return Err(Error::config(format!(
                "precision must be in 1..={MAX_PRECISION}"
            )));
        }
        if o.interval == Some(0) {
            return Err(Error::config("output interval must be > 0"));
        }
        if o.stem.is_empty() {
            return Err(Error::config("output stem must not be empty"));
        }
        Ok(())
    }
}

fn finite(name: &str, v: f64) -> Result<()> {
    if !v.is_finite() {
        return Err(Error::config(format!("{name} must be finite")));
    }
    Ok(())
}

fn positive(name: &str, v: f64) -> Result<()> {
    if !v.is_finite() || v <= 0.0 {
        return Err(Error::config(format!("{name} must be finite and > 0")));
    }
    Ok(())
}

fn non_negative(name: &str, v: f64) -> Result<()> {
    if !v.is_finite() || v < 0.0 {
        return Err(Error::config(format!("{name} must be finite and >= 0")));
    }
    Ok(())
}

fn unit_interval(name: &str, v: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&v) {
        return Err(Error::config(format!("{name} must be in [0, 1]")));
    }
    Ok(())
}
