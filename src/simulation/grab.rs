//! Mouse-grab override
//!
//! Grabbed particles are pinned to `cursor + offset` with zero velocity. The
//! other stages consult `pinned_mask` and leave them alone; they still act as
//! sources for everyone else.

use crate::core::types::{ParticleId, Vec2};
use crate::entity::particle::ParticleStore;

#[derive(Debug, Clone, Default)]
pub struct GrabState {
    cursor: Vec2,
    grabbed: Vec<(ParticleId, Vec2)>,
}

impl GrabState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !self.grabbed.is_empty()
    }

    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    pub fn grabbed(&self) -> impl Iterator<Item = ParticleId> + '_ {
        self.grabbed.iter().map(|(id, _)| *id)
    }

    /// Pick every living particle strictly within its own grab radius
    ///
    /// Replaces any previous grab. Returns the picked ids in storage order.
    pub fn begin(&mut self, store: &mut ParticleStore, cursor: Vec2) -> Vec<ParticleId> {
        self.end(store);
        self.cursor = cursor;
        self.grabbed = store
            .iter_living()
            .filter(|&i| store.positions[i].distance(cursor) < store.tunables[i].grab_radius)
            .map(|i| (store.ids[i], store.positions[i] - cursor))
            .collect();
        self.apply(store);
        self.grabbed().collect()
    }

    pub fn update_target(&mut self, store: &mut ParticleStore, cursor: Vec2) {
        self.cursor = cursor;
        self.apply(store);
    }

    /// Release everything, leaving the particles at rest where they are
    pub fn end(&mut self, store: &mut ParticleStore) {
        for (id, _) in self.grabbed.drain(..) {
            if let Some(i) = store.index_of(id) {
                store.velocities[i] = Vec2::ZERO;
            }
        }
    }

    /// Force grabbed particles onto the cursor
    pub fn apply(&self, store: &mut ParticleStore) {
        for &(id, offset) in &self.grabbed {
            if let Some(i) = store.index_of(id) {
                if store.alive[i] {
                    store.positions[i] = self.cursor + offset;
                    store.velocities[i] = Vec2::ZERO;
                }
            }
        }
    }

    /// One flag per storage slot, true for grabbed particles
    pub fn pinned_mask(&self, store: &ParticleStore) -> Vec<bool> {
        let mut mask = vec![false; store.count()];
        for &(id, _) in &self.grabbed {
            if let Some(i) = store.index_of(id) {
                mask[i] = true;
            }
        }
        mask
    }

    /// Drop particles that no longer exist
    pub fn forget(&mut self, removed: &[ParticleId]) {
        if !removed.is_empty() {
            self.grabbed.retain(|(id, _)| !removed.contains(id));
        }
    }

    pub fn clear(&mut self) {
        self.grabbed.clear();
    }
}
