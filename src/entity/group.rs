//! Particle groups - named collections sharing appearance and default tunables

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::core::types::{Color, GroupId, ParticleId};
use crate::entity::particle::ParticleTunables;

/// Appearance shared by every particle of a group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupStyle {
    pub color: Color,
    /// 0.0 = invisible, 1.0 = opaque
    pub opacity: f32,
}

impl Default for GroupStyle {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            opacity: 1.0,
        }
    }
}

impl GroupStyle {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub style: GroupStyle,
    /// Tunables used for particles spawned without explicit overrides
    pub defaults: ParticleTunables,
    /// Members in spawn order
    pub members: Vec<ParticleId>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// All groups in creation order
///
/// Groups are never destroyed; an empty group stays addressable. `clear`
/// retires every id at once, and numbering continues after the retired ones.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: Vec<Group>,
    /// Id of `groups[0]`
    first_id: u32,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, name: String, style: GroupStyle, defaults: ParticleTunables) -> GroupId {
        let id = GroupId(self.first_id + self.groups.len() as u32);
        self.groups.push(Group {
            id,
            name,
            style,
            defaults,
            members: Vec::new(),
        });
        id
    }

    /// Position of a live group in creation order
    pub fn slot(&self, id: GroupId) -> Option<usize> {
        let slot = id.0.checked_sub(self.first_id)? as usize;
        (slot < self.groups.len()).then_some(slot)
    }

    pub fn get(&self, id: GroupId) -> Option<&Group> {
        self.slot(id).map(|slot| &self.groups[slot])
    }

    pub fn get_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        let slot = self.slot(id)?;
        self.groups.get_mut(slot)
    }

    pub fn contains(&self, id: GroupId) -> bool {
        self.slot(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.groups.iter().map(|g| g.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn find_by_name(&self, name: &str) -> Option<GroupId> {
        self.groups.iter().find(|g| g.name == name).map(|g| g.id)
    }

    /// Drop removed particles from every member list, keeping order
    pub fn prune(&mut self, removed: &[ParticleId]) {
        if removed.is_empty() {
            return;
        }
        let removed: AHashSet<ParticleId> = removed.iter().copied().collect();
        for group in &mut self.groups {
            group.members.retain(|id| !removed.contains(id));
        }
    }

    pub fn clear_members(&mut self) {
        for group in &mut self.groups {
            group.members.clear();
        }
    }

    /// Remove every group; their ids are never handed out again
    pub fn clear(&mut self) {
        self.first_id += self.groups.len() as u32;
        self.groups.clear();
    }
}
