//! Group force rules and short-range collision separation
//!
//! For every ordered group pair `(A, B)` (self pairs included) every particle
//! `a` of `A` is visited against every particle `b` of `B`:
//!
//! - `d == 0`: skipped, the direction is undefined
//! - `d < combined min distance`: collision, both particles pushed apart and damped
//! - `d <= a.force_radius`: `a` alone is accelerated toward `b` by `g * coefficient`
//!
//! The radial rule is one-sided: `b` reacts to `a` only through the `(B, A)`
//! entry. Collision is symmetric.
//!
//! Visit order is group creation order, then storage index order. The
//! positional collision branch mutates positions in place, so this stage is
//! sequential.

use serde::{Deserialize, Serialize};

use crate::core::config::ForceConfig;
use crate::core::types::GroupId;
use crate::entity::particle::ParticleStore;
use crate::rules::matrix::RuleMatrix;

/// How a colliding pair is separated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionMode {
    /// Move both particles half the overlap apart along the normal
    Positional,
    /// Push velocities apart by `repulse_force * overlap`, capped at `max_repulse`
    Velocity,
}

/// Apply the rule matrix over every ordered pair of groups
///
/// `members` holds the living storage indices of each group, in group order.
/// Pinned (grabbed) particles never receive a velocity or position change.
pub fn apply_force_field(
    store: &mut ParticleStore,
    members: &[(GroupId, Vec<usize>)],
    rules: &RuleMatrix,
    speed: f32,
    config: &ForceConfig,
    pinned: &[bool],
) {
    for (group_a, members_a) in members {
        for (group_b, members_b) in members {
            let coefficient = rules.get(*group_a, *group_b);
            apply_rule(store, members_a, members_b, coefficient, speed, config, pinned);
        }
    }
}

/// Evaluate one directed rule between two member lists
pub fn apply_rule(
    store: &mut ParticleStore,
    members_a: &[usize],
    members_b: &[usize],
    coefficient: f32,
    speed: f32,
    config: &ForceConfig,
    pinned: &[bool],
) {
    for &i in members_a {
        for &j in members_b {
            if i == j {
                continue;
            }

            let delta = store.positions[i] - store.positions[j];
            let distance = delta.length();
            if distance <= 0.0 {
                continue;
            }

            let tunables_a = store.tunables[i];
            let tunables_b = store.tunables[j];
            let combined_min_dist = tunables_a
                .min_dist
                .max(tunables_b.min_dist)
                .max((store.sizes[i] + store.sizes[j]) * config.separation_factor);
            // Two eaters overlapping merge in lifecycle instead of bouncing
            let both_eat = tunables_a.enable_eat && tunables_b.enable_eat;

            if !both_eat && distance < combined_min_dist {
                let normal = delta / distance;
                let overlap = combined_min_dist - distance;

                match config.collision_mode {
                    CollisionMode::Positional => {
                        let correction = normal * (overlap / 2.0);
                        if !pinned[i] {
                            store.positions[i] += correction;
                        }
                        if !pinned[j] {
                            store.positions[j] -= correction;
                        }
                    }
                    CollisionMode::Velocity => {
                        let push_a = (tunables_a.repulse_force * overlap).min(config.max_repulse);
                        let push_b = (tunables_b.repulse_force * overlap).min(config.max_repulse);
                        if !pinned[i] {
                            store.velocities[i] += normal * push_a;
                        }
                        if !pinned[j] {
                            store.velocities[j] -= normal * push_b;
                        }
                    }
                }

                if !pinned[i] {
                    store.velocities[i] *= config.collision_damping;
                }
                if !pinned[j] {
                    store.velocities[j] *= config.collision_damping;
                }
            } else if distance <= tunables_a.force_radius && !pinned[i] {
                let scale = speed * coefficient / distance;
                store.velocities[i] -= delta * scale;
            }
        }
    }
}
