use thiserror::Error;

use crate::core::types::{GroupId, ParticleId};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Group not found: {0}")]
    UnknownGroup(GroupId),

    #[error("Particle not found: {0}")]
    UnknownParticle(ParticleId),

    #[error("Invalid rule coefficient {value} for ({a}, {b})")]
    InvalidCoefficient { a: GroupId, b: GroupId, value: f32 },

    #[error("Invalid simulation speed: {0}")]
    InvalidSpeed(f32),

    #[error("Invalid particle tunables: {0}")]
    InvalidTunables(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
