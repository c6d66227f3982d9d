//! Core simulation types: particles, clusters, forces, collisions and the time-stepping loop.

pub mod cluster;
pub mod collision;
pub mod forces;
pub mod integrator;
pub mod particle;
pub mod sim;
pub mod vector;

pub use cluster::ClusterSet;
pub use collision::PairStats;
pub use forces::ForceModel;
pub use integrator::Integrator;
pub use particle::Particle;
pub use sim::{EnergySample, Phase, RunSummary, Simulation};
