//! Toy molecular-dynamics simulator.
//!
//! Atoms in a cubic box feel a spherical confinement plus a few optional force terms, bounce
//! elastically when their cores touch and stick together with some probability when their
//! shells overlap. Snapshots are written in XYZ format.

pub mod config;
pub mod core;
pub mod elements;
pub mod error;
pub mod io;
pub mod sink;

#[cfg(feature = "python")]
mod python;

pub use crate::config::SimConfig;
pub use crate::core::{Phase, RunSummary, Simulation};
pub use crate::error::{Error, Result};
