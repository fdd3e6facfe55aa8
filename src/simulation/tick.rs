//! Tick system - orchestrates one simulation frame
//!
//! Stage order:
//! frame gate -> force field -> integrate -> boundary -> flocking ->
//! impulses -> grab override -> shrink -> eat -> compact -> publish
//!
//! A rejected or paused frame only services the grab override and republishes
//! the snapshot, so grabbed particles keep tracking the cursor.

use crate::core::types::{GroupId, ParticleId, Tick};
use crate::engine::Engine;
use crate::simulation::flocking::flock;
use crate::simulation::force_field::apply_force_field;
use crate::simulation::impulse::ImpulseReport;
use crate::simulation::integration::integrate;
use crate::simulation::lifecycle::{resolve_eating, shrink};

/// Events generated during a simulation tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickEvent {
    /// A particle shrank to nothing
    Shrunk { particle: ParticleId },
    /// `survivor` absorbed `eaten`
    Merged { survivor: ParticleId, eaten: ParticleId },
}

/// Outcome of one `tick` call
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Tick counter after this call
    pub tick: Tick,
    /// Whether the dynamic stages ran
    pub advanced: bool,
    pub living: usize,
    pub impulses: ImpulseReport,
    pub events: Vec<TickEvent>,
}

impl TickReport {
    pub fn removed(&self) -> impl Iterator<Item = ParticleId> + '_ {
        self.events.iter().map(|event| match event {
            TickEvent::Shrunk { particle } => *particle,
            TickEvent::Merged { eaten, .. } => *eaten,
        })
    }
}

/// Run one frame against the engine state
pub fn run_simulation_tick(engine: &mut Engine, now_ms: f64) -> TickReport {
    let accepted = engine.clock.accept_frame(now_ms);
    if !accepted || engine.clock.is_paused() {
        engine.grab.apply(&mut engine.store);
        engine.publish();
        return TickReport {
            tick: engine.tick,
            advanced: false,
            living: engine.store.living_count(),
            ..TickReport::default()
        };
    }

    let speed = engine.clock.speed();
    let pinned = engine.grab.pinned_mask(&engine.store);
    let members = group_members(engine);

    apply_force_field(
        &mut engine.store,
        &members,
        &engine.rules,
        speed,
        &engine.config.force,
        &pinned,
    );
    integrate(&mut engine.store, speed, &engine.config.integration, &pinned);
    engine.config.boundary.contain(&mut engine.store, speed, &pinned);
    flock(
        &mut engine.store,
        speed,
        &engine.config.flocking,
        &engine.config.spatial,
        &pinned,
    );
    let impulses = engine.impulses.apply(
        &mut engine.store,
        now_ms,
        speed,
        &engine.config.impulse,
        &mut engine.rng,
        &pinned,
    );
    engine.grab.apply(&mut engine.store);

    let mut events: Vec<TickEvent> = shrink(&mut engine.store)
        .into_iter()
        .map(|particle| TickEvent::Shrunk { particle })
        .collect();
    events.extend(
        resolve_eating(&mut engine.store, &engine.config.lifecycle)
            .into_iter()
            .map(|(survivor, eaten)| TickEvent::Merged { survivor, eaten }),
    );

    let removed = engine.store.compact();
    engine.groups.prune(&removed);
    engine.grab.forget(&removed);

    engine.tick += 1;
    engine.publish();

    let living = engine.store.living_count();
    tracing::debug!(
        tick = engine.tick,
        living,
        removed = removed.len(),
        shocked = impulses.shocked,
        charges = impulses.charges,
        "Tick complete"
    );

    TickReport {
        tick: engine.tick,
        advanced: true,
        living,
        impulses,
        events,
    }
}

/// Living storage indices per group, in group creation order
fn group_members(engine: &Engine) -> Vec<(GroupId, Vec<usize>)> {
    let mut members: Vec<(GroupId, Vec<usize>)> =
        engine.groups.ids().map(|id| (id, Vec::new())).collect();
    for i in engine.store.iter_living() {
        let slot = engine.groups.slot(engine.store.groups[i]);
        if let Some((_, bucket)) = slot.and_then(|slot| members.get_mut(slot)) {
            bucket.push(i);
        }
    }
    members
}
