//! Read-only render state published after every tick

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

use crate::core::error::Result;
use crate::core::types::{Color, GroupId, ParticleId, Tick, Vec2};
use crate::entity::particle::ParticleStore;

/// Everything a renderer needs to draw one particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParticleView {
    pub id: ParticleId,
    pub group: GroupId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub color: Color,
    pub opacity: f32,
    /// Radians, derived from velocity
    pub heading: f32,
}

/// Living particles in storage order (ascending id)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderSnapshot {
    pub tick: Tick,
    pub particles: Vec<ParticleView>,
}

impl ParticleView {
    pub(crate) fn from_store(store: &ParticleStore, index: usize) -> Self {
        Self {
            id: store.ids[index],
            group: store.groups[index],
            position: store.positions[index],
            velocity: store.velocities[index],
            size: store.sizes[index],
            color: store.colors[index],
            opacity: store.opacities[index],
            heading: store.headings[index],
        }
    }
}

impl RenderSnapshot {
    pub fn capture(store: &ParticleStore, tick: Tick) -> Self {
        let particles = store
            .iter_living()
            .map(|i| ParticleView::from_store(store, i))
            .collect();
        Self { tick, particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn get(&self, id: ParticleId) -> Option<&ParticleView> {
        self.particles
            .binary_search_by_key(&id, |p| p.id)
            .ok()
            .map(|i| &self.particles[i])
    }

    pub fn by_group(&self, group: GroupId) -> impl Iterator<Item = &ParticleView> + '_ {
        self.particles.iter().filter(move |p| p.group == group)
    }

    /// Pack for an instanced draw call
    pub fn instances(&self) -> Vec<RenderInstance> {
        self.particles.iter().map(RenderInstance::from).collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// GPU instance data for one particle. 24 bytes, tightly packed.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct RenderInstance {
    /// World position (x, y).
    pub position: [f32; 2], // 8 bytes
    /// Heading in radians.
    pub rotation: f32, // 4 bytes
    /// Current radius.
    pub scale: f32, // 4 bytes
    /// Packed RGBA color.
    pub color: u32, // 4 bytes
    pub group: u32, // 4 bytes
}

impl From<&ParticleView> for RenderInstance {
    fn from(view: &ParticleView) -> Self {
        Self {
            position: view.position.to_array(),
            rotation: view.heading,
            scale: view.size,
            color: view.color.to_rgba_u32(view.opacity),
            group: view.group.0,
        }
    }
}
