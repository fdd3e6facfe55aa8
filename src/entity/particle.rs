//! Particle storage with SoA layout

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};
use crate::core::types::{Color, GroupId, ParticleId, Vec2};

/// Sizes at or below this count as dead
///
/// Absorbs f32 drift from repeated shrinking so a particle reaches zero on the
/// tick its nominal size does.
pub const MIN_LIVE_SIZE: f32 = 1e-4;

/// Per-particle tunables, copied from the group defaults at spawn time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleTunables {
    /// Radius at spawn; `size` starts here and only shrinks or grows by merging
    pub initial_size: f32,
    /// Cutoff distance for the group force rule
    pub force_radius: f32,
    /// Hard-collision distance (combined with the pair's sizes)
    pub min_dist: f32,
    /// Collision push strength in velocity collision mode
    pub repulse_force: f32,
    /// Velocity multiplier per tick (0.0-1.0)
    pub friction: f32,
    /// Size lost per tick when `enable_shrink` is set
    pub shrink_rate: f32,
    /// Distance from the cursor within which a grab picks this particle
    pub grab_radius: f32,
    pub enable_eat: bool,
    pub enable_shrink: bool,
}

impl Default for ParticleTunables {
    fn default() -> Self {
        Self {
            initial_size: 0.5,
            force_radius: 20.0,
            min_dist: 1.0,
            repulse_force: 0.1,
            friction: 0.95,
            shrink_rate: 0.001,
            grab_radius: 4.0,
            enable_eat: false,
            enable_shrink: false,
        }
    }
}

impl ParticleTunables {
    /// A living cell: shrinks over time and can eat other cells
    pub fn cell() -> Self {
        Self {
            initial_size: 0.5,
            force_radius: 80.0,
            min_dist: 1.0,
            repulse_force: 0.1,
            friction: 0.95,
            shrink_rate: 0.001,
            grab_radius: 3.0,
            enable_eat: true,
            enable_shrink: true,
        }
    }

    pub fn with_force_radius(mut self, force_radius: f32) -> Self {
        self.force_radius = force_radius;
        self
    }

    pub fn with_size(mut self, initial_size: f32) -> Self {
        self.initial_size = initial_size;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("initial_size", self.initial_size),
            ("force_radius", self.force_radius),
            ("min_dist", self.min_dist),
            ("repulse_force", self.repulse_force),
            ("friction", self.friction),
            ("shrink_rate", self.shrink_rate),
            ("grab_radius", self.grab_radius),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidTunables(format!(
                    "{} must be finite and >= 0, got {}",
                    name, value
                )));
            }
        }
        if self.initial_size <= MIN_LIVE_SIZE {
            return Err(EngineError::InvalidTunables(format!(
                "initial_size must exceed {}, got {}",
                MIN_LIVE_SIZE, self.initial_size
            )));
        }
        if self.friction > 1.0 {
            return Err(EngineError::InvalidTunables(format!(
                "friction must be <= 1, got {}",
                self.friction
            )));
        }
        Ok(())
    }
}

/// Structure of Arrays for particles
///
/// Index order is spawn order. Dead particles keep their slot (with
/// `alive == false`) until `compact`, which preserves the relative order of
/// the survivors.
pub struct ParticleStore {
    pub ids: Vec<ParticleId>,
    pub groups: Vec<GroupId>,
    pub positions: Vec<Vec2>,
    pub velocities: Vec<Vec2>,
    /// Display heading in radians, derived from velocity
    pub headings: Vec<f32>,
    pub sizes: Vec<f32>,
    pub initial_sizes: Vec<f32>,
    pub colors: Vec<Color>,
    pub opacities: Vec<f32>,
    pub tunables: Vec<ParticleTunables>,
    pub alive: Vec<bool>,
    index: AHashMap<ParticleId, usize>,
}

impl Default for ParticleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticleStore {
    pub fn new() -> Self {
        Self {
            ids: Vec::new(),
            groups: Vec::new(),
            positions: Vec::new(),
            velocities: Vec::new(),
            headings: Vec::new(),
            sizes: Vec::new(),
            initial_sizes: Vec::new(),
            colors: Vec::new(),
            opacities: Vec::new(),
            tunables: Vec::new(),
            alive: Vec::new(),
            index: AHashMap::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn living_count(&self) -> usize {
        self.alive.iter().filter(|&&alive| alive).count()
    }

    pub fn spawn(
        &mut self,
        id: ParticleId,
        group: GroupId,
        position: Vec2,
        color: Color,
        opacity: f32,
        tunables: ParticleTunables,
    ) -> usize {
        let index = self.ids.len();
        self.ids.push(id);
        self.groups.push(group);
        self.positions.push(position);
        self.velocities.push(Vec2::ZERO);
        self.headings.push(0.0);
        self.sizes.push(tunables.initial_size);
        self.initial_sizes.push(tunables.initial_size);
        self.colors.push(color);
        self.opacities.push(opacity);
        self.tunables.push(tunables);
        self.alive.push(true);
        self.index.insert(id, index);
        index
    }

    pub fn index_of(&self, id: ParticleId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn iter_living(&self) -> impl Iterator<Item = usize> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, &alive)| alive)
            .map(|(i, _)| i)
    }

    pub fn kill(&mut self, index: usize) {
        self.alive[index] = false;
    }

    /// Drop dead slots, keeping survivor order. Returns the removed ids.
    pub fn compact(&mut self) -> Vec<ParticleId> {
        if self.alive.iter().all(|&alive| alive) {
            return Vec::new();
        }

        let removed: Vec<ParticleId> = self
            .ids
            .iter()
            .zip(&self.alive)
            .filter(|(_, &alive)| !alive)
            .map(|(&id, _)| id)
            .collect();

        let keep = std::mem::take(&mut self.alive);
        retain_by_mask(&mut self.ids, &keep);
        retain_by_mask(&mut self.groups, &keep);
        retain_by_mask(&mut self.positions, &keep);
        retain_by_mask(&mut self.velocities, &keep);
        retain_by_mask(&mut self.headings, &keep);
        retain_by_mask(&mut self.sizes, &keep);
        retain_by_mask(&mut self.initial_sizes, &keep);
        retain_by_mask(&mut self.colors, &keep);
        retain_by_mask(&mut self.opacities, &keep);
        retain_by_mask(&mut self.tunables, &keep);
        self.alive = vec![true; self.ids.len()];

        self.index = self
            .ids
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();

        removed
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

fn retain_by_mask<T>(values: &mut Vec<T>, keep: &[bool]) {
    let mut flags = keep.iter();
    values.retain(|_| *flags.next().unwrap_or(&false));
}
