pub mod group;
pub mod particle;

pub use group::{Group, GroupRegistry, GroupStyle};
pub use particle::{ParticleStore, ParticleTunables, MIN_LIVE_SIZE};
