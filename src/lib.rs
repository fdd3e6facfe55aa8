//! Particle Life - 2D group-rule particle simulation engine
//!
//! Colored groups of point masses attract or repel each other through a
//! directed coefficient matrix. The `Engine` runs one frame per `tick`:
//! force rules and collisions, integration, boundary containment, flocking,
//! impulses, the grab override and lifecycle (shrink and merge). Rendering is
//! left to the caller, which reads the published `RenderSnapshot`.

pub mod core;
pub mod engine;
pub mod entity;
pub mod rules;
pub mod simulation;
pub mod spatial;

pub use crate::core::config::EngineConfig;
pub use crate::core::error::{EngineError, Result};
pub use crate::core::types::{Color, GroupId, ParticleId, Tick, Vec2};
pub use crate::engine::{Engine, ParticleView, RenderInstance, RenderSnapshot};
pub use crate::entity::{GroupStyle, ParticleTunables};
pub use crate::rules::Scenario;
pub use crate::simulation::{
    Boundary, BoundaryResponse, BoundaryShape, ClockState, CollisionMode, SpeedPreset, TickEvent,
    TickReport,
};
