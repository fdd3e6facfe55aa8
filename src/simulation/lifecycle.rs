//! Shrink-and-die and eat/merge resolution
//!
//! Both passes only mark particles dead. Slots are reclaimed by
//! `ParticleStore::compact` at the end of the tick, so indices stay valid
//! while the pair scan runs.

use std::f32::consts::PI;

use crate::core::config::LifecycleConfig;
use crate::core::types::ParticleId;
use crate::entity::particle::{ParticleStore, MIN_LIVE_SIZE};

/// Shrink every shrink-enabled particle. Returns the ids that died.
pub fn shrink(store: &mut ParticleStore) -> Vec<ParticleId> {
    let mut died = Vec::new();
    for i in 0..store.count() {
        if !store.alive[i] || !store.tunables[i].enable_shrink {
            continue;
        }
        store.sizes[i] -= store.tunables[i].shrink_rate;
        if store.sizes[i] <= MIN_LIVE_SIZE {
            store.sizes[i] = 0.0;
            store.kill(i);
            tracing::trace!(particle = %store.ids[i], "shrank away");
            died.push(store.ids[i]);
        }
    }
    died
}

/// Merge overlapping eat-enabled particles
///
/// Pairs are visited once each in ascending index order. The larger particle
/// survives (lower index on a tie) with the summed area and the area-weighted
/// mean velocity. Returns `(survivor, eaten)` pairs in resolution order.
pub fn resolve_eating(
    store: &mut ParticleStore,
    config: &LifecycleConfig,
) -> Vec<(ParticleId, ParticleId)> {
    let candidates: Vec<usize> = store
        .iter_living()
        .filter(|&i| store.tunables[i].enable_eat)
        .collect();

    let mut merges = Vec::new();
    for (n, &i) in candidates.iter().enumerate() {
        for &j in &candidates[n + 1..] {
            if !store.alive[i] {
                break;
            }
            if !store.alive[j] {
                continue;
            }

            let threshold = (store.sizes[i] + store.sizes[j]) * config.eat_distance_factor;
            if store.positions[i].distance(store.positions[j]) >= threshold {
                continue;
            }

            let (survivor, eaten) = if store.sizes[j] > store.sizes[i] { (j, i) } else { (i, j) };
            merge(store, survivor, eaten);
            tracing::trace!(survivor = %store.ids[survivor], eaten = %store.ids[eaten], "merged");
            merges.push((store.ids[survivor], store.ids[eaten]));
        }
    }
    merges
}

fn merge(store: &mut ParticleStore, survivor: usize, eaten: usize) {
    let area_survivor = PI * store.sizes[survivor].powi(2);
    let area_eaten = PI * store.sizes[eaten].powi(2);
    let total = area_survivor + area_eaten;

    store.velocities[survivor] =
        (store.velocities[survivor] * area_survivor + store.velocities[eaten] * area_eaten) / total;
    store.sizes[survivor] = (total / PI).sqrt();
    store.sizes[eaten] = 0.0;
    store.kill(eaten);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Color, GroupId, Vec2};
    use crate::entity::particle::ParticleTunables;

    fn eater(size: f32) -> ParticleTunables {
        ParticleTunables {
            enable_eat: true,
            ..ParticleTunables::default().with_size(size)
        }
    }

    fn spawn(store: &mut ParticleStore, id: u32, position: Vec2, tunables: ParticleTunables) {
        store.spawn(ParticleId(id), GroupId(0), position, Color::WHITE, 1.0, tunables);
    }

    #[test]
    fn test_shrink_dies_on_exact_tick() {
        let mut store = ParticleStore::new();
        let tunables = ParticleTunables {
            enable_shrink: true,
            shrink_rate: 0.01,
            ..ParticleTunables::default().with_size(0.5)
        };
        spawn(&mut store, 0, Vec2::ZERO, tunables);

        for _ in 0..49 {
            assert!(shrink(&mut store).is_empty());
        }
        assert!(store.alive[0]);
        assert!(store.sizes[0] > 0.0);

        assert_eq!(shrink(&mut store), vec![ParticleId(0)]);
        assert!(!store.alive[0]);
    }

    #[test]
    fn test_shrink_disabled_keeps_size() {
        let mut store = ParticleStore::new();
        spawn(&mut store, 0, Vec2::ZERO, ParticleTunables::default());
        shrink(&mut store);
        assert_eq!(store.sizes[0], 0.5);
    }

    #[test]
    fn test_merge_conserves_area() {
        let mut store = ParticleStore::new();
        spawn(&mut store, 0, Vec2::ZERO, eater(0.3));
        spawn(&mut store, 1, Vec2::new(0.2, 0.0), eater(0.4));

        let merges = resolve_eating(&mut store, &LifecycleConfig::default());

        assert_eq!(merges, vec![(ParticleId(1), ParticleId(0))]);
        let expected = ((PI * 0.09 + PI * 0.16) / PI).sqrt();
        assert!((store.sizes[1] - expected).abs() < 1e-6);
        assert!(!store.alive[0]);
        assert_eq!(store.living_count(), 1);
    }

    #[test]
    fn test_equal_sizes_lower_index_survives() {
        let mut store = ParticleStore::new();
        spawn(&mut store, 0, Vec2::ZERO, eater(0.5));
        spawn(&mut store, 1, Vec2::new(0.1, 0.0), eater(0.5));

        let merges = resolve_eating(&mut store, &LifecycleConfig::default());

        assert_eq!(merges, vec![(ParticleId(0), ParticleId(1))]);
        assert!(store.alive[0]);
    }

    #[test]
    fn test_merge_velocity_is_area_weighted() {
        let mut store = ParticleStore::new();
        spawn(&mut store, 0, Vec2::ZERO, eater(0.5));
        spawn(&mut store, 1, Vec2::new(0.1, 0.0), eater(0.5));
        store.velocities[0] = Vec2::new(2.0, 0.0);
        store.velocities[1] = Vec2::new(0.0, 2.0);

        resolve_eating(&mut store, &LifecycleConfig::default());

        assert!((store.velocities[0] - Vec2::new(1.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn test_non_eaters_never_merge() {
        let mut store = ParticleStore::new();
        spawn(&mut store, 0, Vec2::ZERO, eater(0.5));
        spawn(&mut store, 1, Vec2::new(0.1, 0.0), ParticleTunables::default());

        assert!(resolve_eating(&mut store, &LifecycleConfig::default()).is_empty());
        assert_eq!(store.living_count(), 2);
    }

    #[test]
    fn test_chain_merge_each_pair_once() {
        let mut store = ParticleStore::new();
        spawn(&mut store, 0, Vec2::ZERO, eater(0.5));
        spawn(&mut store, 1, Vec2::new(0.3, 0.0), eater(0.2));
        spawn(&mut store, 2, Vec2::new(-0.3, 0.0), eater(0.2));

        let merges = resolve_eating(&mut store, &LifecycleConfig::default());

        assert_eq!(merges.len(), 2);
        assert_eq!(store.living_count(), 1);
        let expected = (0.25f32 + 0.04 + 0.04).sqrt();
        assert!((store.sizes[0] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_far_apart_eaters_untouched() {
        let mut store = ParticleStore::new();
        spawn(&mut store, 0, Vec2::ZERO, eater(0.5));
        spawn(&mut store, 1, Vec2::new(1.0, 0.0), eater(0.5));

        assert!(resolve_eating(&mut store, &LifecycleConfig::default()).is_empty());
    }
}
