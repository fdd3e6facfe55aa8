//! Boid-style alignment and cohesion over all living particles
//!
//! Group-agnostic: every particle looks at every other living particle within
//! `force_radius * radius_factor`. Nudges are computed from the positions and
//! velocities as they stand at the start of the stage and committed together,
//! so the result does not depend on visit order and the parallel path matches
//! the serial one bit for bit.

use rayon::prelude::*;

use crate::core::config::{FlockingConfig, SpatialConfig};
use crate::core::types::Vec2;
use crate::entity::particle::ParticleStore;
use crate::spatial::sparse_hash::SparseHashGrid;

/// Run the flocking stage. Returns the number of particles nudged.
pub fn flock(
    store: &mut ParticleStore,
    speed: f32,
    config: &FlockingConfig,
    spatial: &SpatialConfig,
    pinned: &[bool],
) -> usize {
    if !config.enabled || config.intensity <= 0.0 || speed <= 0.0 {
        return 0;
    }

    let living: Vec<usize> = store.iter_living().collect();
    if living.len() < 2 {
        return 0;
    }

    let grid = if spatial.use_grid {
        let max_radius = living
            .iter()
            .map(|&i| store.tunables[i].force_radius * config.radius_factor)
            .fold(0.0_f32, f32::max);
        if max_radius > 0.0 {
            let mut grid = SparseHashGrid::new(max_radius);
            grid.rebuild(living.iter().map(|&i| (i, store.positions[i])));
            Some(grid)
        } else {
            None
        }
    } else {
        None
    };

    let view = FlockView {
        store: &*store,
        living: &living,
        grid: grid.as_ref(),
        config,
        speed,
        pinned,
    };

    let nudges: Vec<Option<Vec2>> = if living.len() >= spatial.parallel_threshold {
        living.par_iter().map(|&i| view.nudge(i)).collect()
    } else {
        living.iter().map(|&i| view.nudge(i)).collect()
    };

    let mut nudged = 0;
    for (&i, nudge) in living.iter().zip(nudges) {
        if let Some(delta) = nudge {
            store.velocities[i] += delta;
            nudged += 1;
        }
    }
    nudged
}

/// Read-only view used while computing nudges
struct FlockView<'a> {
    store: &'a ParticleStore,
    living: &'a [usize],
    grid: Option<&'a SparseHashGrid>,
    config: &'a FlockingConfig,
    speed: f32,
    pinned: &'a [bool],
}

impl FlockView<'_> {
    fn nudge(&self, i: usize) -> Option<Vec2> {
        if self.pinned[i] {
            return None;
        }

        let position = self.store.positions[i];
        let radius = self.store.tunables[i].force_radius * self.config.radius_factor;
        if radius <= 0.0 {
            return None;
        }

        let mut velocity_sum = Vec2::ZERO;
        let mut position_sum = Vec2::ZERO;
        let mut count = 0usize;
        let mut visit = |j: usize| {
            if j != i && position.distance(self.store.positions[j]) < radius {
                velocity_sum += self.store.velocities[j];
                position_sum += self.store.positions[j];
                count += 1;
            }
        };

        match self.grid {
            Some(grid) => grid
                .query_radius(position, radius, &self.store.positions)
                .into_iter()
                .for_each(&mut visit),
            None => self.living.iter().copied().for_each(&mut visit),
        }

        if count == 0 {
            return None;
        }

        let inv = 1.0 / count as f32;
        let mean_velocity = velocity_sum * inv;
        let mean_position = position_sum * inv;
        let gain = self.config.intensity * self.speed;

        let alignment = (mean_velocity - self.store.velocities[i]) * self.config.alignment;
        let cohesion = (mean_position - position) * self.config.cohesion;
        Some((alignment + cohesion) * gain)
    }
}
