pub mod config;
pub mod error;
pub mod types;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use types::{Color, GroupId, ParticleId, Tick, Vec2};
