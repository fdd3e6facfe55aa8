//! Explicit Euler integration at the fixed frame step
//!
//! `velocity *= friction; position += velocity * speed`. Stability comes from
//! friction and collision damping, not from the integrator.

use crate::core::config::IntegrationConfig;
use crate::entity::particle::ParticleStore;

pub fn integrate(store: &mut ParticleStore, speed: f32, config: &IntegrationConfig, pinned: &[bool]) {
    for i in 0..store.count() {
        if !store.alive[i] || pinned[i] {
            continue;
        }

        let mut velocity = store.velocities[i] * store.tunables[i].friction;
        if let Some(max_speed) = config.max_speed {
            velocity = velocity.clamp_length_max(max_speed);
        }

        store.velocities[i] = velocity;
        store.positions[i] += velocity * speed;

        if velocity.length() > config.heading_min_speed {
            store.headings[i] = velocity.y.atan2(velocity.x);
        }
    }
}
