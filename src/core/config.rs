//! Engine configuration with documented constants
//!
//! All tuning numbers of the simulation are collected here. The defaults are
//! heuristic values tuned for visual behavior, not physical units: forces,
//! friction and damping interact, so change them together.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{EngineError, Result};
use crate::simulation::boundary::Boundary;
use crate::simulation::force_field::CollisionMode;

/// Top-level configuration consumed by `Engine::new`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for the engine-owned RNG (spawn positions, shocks, random rules)
    pub seed: u64,
    pub clock: ClockConfig,
    pub force: ForceConfig,
    pub integration: IntegrationConfig,
    pub flocking: FlockingConfig,
    pub impulse: ImpulseConfig,
    pub lifecycle: LifecycleConfig,
    pub boundary: Boundary,
    pub spatial: SpatialConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            clock: ClockConfig::default(),
            force: ForceConfig::default(),
            integration: IntegrationConfig::default(),
            flocking: FlockingConfig::default(),
            impulse: ImpulseConfig::default(),
            lifecycle: LifecycleConfig::default(),
            boundary: Boundary::default(),
            spatial: SpatialConfig::default(),
        }
    }
}

// === CLOCK ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Speed scalar `g` at "1x"
    ///
    /// Multiplies rule forces, displacement, flocking and impulses.
    pub base_speed: f32,

    /// Minimum wall time between accepted ticks (milliseconds)
    ///
    /// 1000/60 gates the loop at 60 Hz. Zero accepts every tick.
    pub frame_duration_ms: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            base_speed: 1.2,
            frame_duration_ms: 1000.0 / 60.0,
        }
    }
}

// === FORCES & COLLISION ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    /// How overlapping particles are pushed apart
    pub collision_mode: CollisionMode,

    /// Collision threshold as a multiple of the pair's combined size
    ///
    /// At 3.0 two particles of size 0.5 start colliding at distance 3.0,
    /// which reads as a membrane around each cell.
    pub separation_factor: f32,

    /// Velocity multiplier applied to both particles of a colliding pair
    pub collision_damping: f32,

    /// Cap on the per-pair velocity push in `CollisionMode::Velocity`
    pub max_repulse: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            collision_mode: CollisionMode::Positional,
            separation_factor: 3.0,
            collision_damping: 0.85,
            max_repulse: 0.2,
        }
    }
}

// === INTEGRATION ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    /// Optional hard cap on velocity magnitude after friction
    pub max_speed: Option<f32>,

    /// Below this speed the displayed heading is left unchanged
    pub heading_min_speed: f32,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            max_speed: None,
            heading_min_speed: 0.001,
        }
    }
}

// === FLOCKING ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockingConfig {
    pub enabled: bool,

    /// Global gate on alignment + cohesion (0.0 disables the nudge)
    pub intensity: f32,

    /// Neighborhood radius as a multiple of the particle's force radius
    pub radius_factor: f32,

    /// Weight of the pull toward the mean neighbor velocity
    pub alignment: f32,

    /// Weight of the pull toward the mean neighbor position
    ///
    /// Kept far below `alignment`: cohesion scales with distance while
    /// alignment scales with a velocity difference.
    pub cohesion: f32,
}

impl Default for FlockingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 1.0,
            radius_factor: 2.5,
            alignment: 0.12,
            cohesion: 0.0006,
        }
    }
}

// === IMPULSES ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpulseConfig {
    /// Amplitude of the ambient sin/cos perturbation (before speed scaling)
    pub noise_force: f32,

    /// Factor converting the tick timestamp (ms) into noise phase
    pub noise_time_scale: f64,

    /// Shock impulse magnitude range, multiplied by speed
    pub shock_strength_min: f32,
    pub shock_strength_max: f32,

    /// Electric charge impulse magnitude range (not speed scaled)
    pub charge_strength_min: f32,
    pub charge_strength_max: f32,
}

impl Default for ImpulseConfig {
    fn default() -> Self {
        Self {
            noise_force: 0.04,
            noise_time_scale: 0.001,
            shock_strength_min: 1.5,
            shock_strength_max: 2.5,
            charge_strength_min: 5.0,
            charge_strength_max: 15.0,
        }
    }
}

// === LIFECYCLE ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Eat threshold as a multiple of the pair's combined size
    pub eat_distance_factor: f32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            eat_distance_factor: 1.0,
        }
    }
}

// === SPATIAL / PARALLEL ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Bound the flocking neighbor scan with a sparse hash grid
    pub use_grid: bool,

    /// Minimum alive count before flocking runs on the rayon pool
    ///
    /// Below this, thread overhead exceeds the benefit.
    pub parallel_threshold: usize,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            use_grid: false,
            parallel_threshold: 1000,
        }
    }
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(EngineError::InvalidConfig(message()))
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (partial) TOML document; missing fields keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let clock = &self.clock;
        ensure(clock.base_speed.is_finite() && clock.base_speed > 0.0, || {
            format!("clock.base_speed must be positive, got {}", clock.base_speed)
        })?;
        ensure(
            clock.frame_duration_ms.is_finite() && clock.frame_duration_ms >= 0.0,
            || format!("clock.frame_duration_ms must be >= 0, got {}", clock.frame_duration_ms),
        )?;

        let force = &self.force;
        ensure(force.separation_factor >= 0.0, || {
            format!("force.separation_factor must be >= 0, got {}", force.separation_factor)
        })?;
        ensure((0.0..=1.0).contains(&force.collision_damping), || {
            format!("force.collision_damping must be in [0, 1], got {}", force.collision_damping)
        })?;
        ensure(force.max_repulse >= 0.0, || {
            format!("force.max_repulse must be >= 0, got {}", force.max_repulse)
        })?;

        if let Some(max_speed) = self.integration.max_speed {
            ensure(max_speed.is_finite() && max_speed > 0.0, || {
                format!("integration.max_speed must be positive, got {}", max_speed)
            })?;
        }

        let flocking = &self.flocking;
        ensure(
            flocking.intensity >= 0.0 && flocking.radius_factor >= 0.0,
            || "flocking.intensity and flocking.radius_factor must be >= 0".into(),
        )?;

        let impulse = &self.impulse;
        ensure(impulse.noise_force.is_finite(), || "impulse.noise_force must be finite".into())?;
        ensure(
            0.0 <= impulse.shock_strength_min && impulse.shock_strength_min <= impulse.shock_strength_max,
            || {
                format!(
                    "impulse shock range [{}, {}] is not ordered",
                    impulse.shock_strength_min, impulse.shock_strength_max
                )
            },
        )?;
        ensure(
            0.0 <= impulse.charge_strength_min && impulse.charge_strength_min <= impulse.charge_strength_max,
            || {
                format!(
                    "impulse charge range [{}, {}] is not ordered",
                    impulse.charge_strength_min, impulse.charge_strength_max
                )
            },
        )?;

        ensure(self.lifecycle.eat_distance_factor >= 0.0, || {
            "lifecycle.eat_distance_factor must be >= 0".into()
        })?;

        self.boundary.validate()
    }
}
