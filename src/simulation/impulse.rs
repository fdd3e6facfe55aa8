//! External perturbations: ambient noise, held shocks and one-shot charges

use rand::Rng;
use std::f32::consts::TAU;

use crate::core::config::ImpulseConfig;
use crate::core::types::Vec2;
use crate::entity::particle::ParticleStore;

/// Pending and active impulse triggers owned by the engine
#[derive(Debug, Clone, Default)]
pub struct ImpulseBus {
    shock_active: bool,
    pending_charges: u32,
}

/// What the impulse stage did this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImpulseReport {
    pub shocked: bool,
    pub charges: u32,
}

impl ImpulseBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_shock(&mut self, active: bool) {
        self.shock_active = active;
    }

    pub fn shock_active(&self) -> bool {
        self.shock_active
    }

    /// Queue one electric charge for the next applied impulse stage
    pub fn trigger_charge(&mut self) {
        self.pending_charges = self.pending_charges.saturating_add(1);
    }

    pub fn pending_charges(&self) -> u32 {
        self.pending_charges
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Apply noise, the active shock and all queued charges to unpinned particles
    ///
    /// Noise and shock scale with `speed`; a charge does not.
    pub fn apply<R: Rng>(
        &mut self,
        store: &mut ParticleStore,
        now_ms: f64,
        speed: f32,
        config: &ImpulseConfig,
        rng: &mut R,
        pinned: &[bool],
    ) -> ImpulseReport {
        let phase = now_ms * config.noise_time_scale;
        let noise = config.noise_force * speed;
        let shocked = self.shock_active && speed > 0.0;
        let charges = std::mem::take(&mut self.pending_charges);

        for i in 0..store.count() {
            if !store.alive[i] || pinned[i] {
                continue;
            }

            if noise != 0.0 {
                store.velocities[i] += ambient_noise(phase, store.positions[i]) * noise;
            }

            if shocked {
                let strength = rng.gen_range(config.shock_strength_min..=config.shock_strength_max);
                store.velocities[i] += random_direction(rng) * (strength * speed);
            }

            for _ in 0..charges {
                let strength = rng.gen_range(config.charge_strength_min..=config.charge_strength_max);
                store.velocities[i] += random_direction(rng) * strength;
            }
        }

        ImpulseReport { shocked, charges }
    }
}

/// Smooth, position-dependent perturbation with unit amplitude per axis
fn ambient_noise(phase: f64, position: Vec2) -> Vec2 {
    Vec2::new(
        (phase + position.x as f64).sin() as f32,
        (phase + position.y as f64).cos() as f32,
    )
}

fn random_direction<R: Rng>(rng: &mut R) -> Vec2 {
    let angle = rng.gen_range(0.0..TAU);
    Vec2::new(angle.cos(), angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Color, GroupId, ParticleId};
    use crate::entity::particle::ParticleTunables;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn store_of(n: u32) -> ParticleStore {
        let mut store = ParticleStore::new();
        for i in 0..n {
            store.spawn(
                ParticleId(i),
                GroupId(0),
                Vec2::new(i as f32 * 3.0, 1.0),
                Color::WHITE,
                1.0,
                ParticleTunables::default(),
            );
        }
        store
    }

    fn quiet() -> ImpulseConfig {
        ImpulseConfig {
            noise_force: 0.0,
            ..ImpulseConfig::default()
        }
    }

    #[test]
    fn test_noise_is_bounded_and_deterministic() {
        let mut a = store_of(10);
        let mut b = store_of(10);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let config = ImpulseConfig::default();
        let pinned = vec![false; 10];

        ImpulseBus::new().apply(&mut a, 1234.0, 1.0, &config, &mut rng, &pinned);
        ImpulseBus::new().apply(&mut b, 1234.0, 1.0, &config, &mut rng, &pinned);

        assert_eq!(a.velocities, b.velocities);
        for v in &a.velocities {
            assert!(v.x.abs() <= 0.04 + 1e-6 && v.y.abs() <= 0.04 + 1e-6);
        }
        assert!(a.velocities.iter().any(|v| *v != Vec2::ZERO));
    }

    #[test]
    fn test_noise_scaled_by_speed() {
        let mut store = store_of(4);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        ImpulseBus::new().apply(&mut store, 50.0, 0.0, &ImpulseConfig::default(), &mut rng, &[false; 4]);
        assert!(store.velocities.iter().all(|v| *v == Vec2::ZERO));
    }

    #[test]
    fn test_shock_magnitude_in_range_while_active() {
        let mut store = store_of(50);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut bus = ImpulseBus::new();
        bus.set_shock(true);

        let report = bus.apply(&mut store, 0.0, 2.0, &quiet(), &mut rng, &vec![false; 50]);

        assert!(report.shocked);
        for v in &store.velocities {
            let magnitude = v.length();
            assert!(magnitude >= 1.5 * 2.0 - 1e-4 && magnitude <= 2.5 * 2.0 + 1e-4);
        }

        // Still active on the next tick
        assert!(bus.apply(&mut store, 16.0, 2.0, &quiet(), &mut rng, &vec![false; 50]).shocked);

        bus.set_shock(false);
        let before = store.velocities.clone();
        assert!(!bus.apply(&mut store, 32.0, 2.0, &quiet(), &mut rng, &vec![false; 50]).shocked);
        assert_eq!(store.velocities, before);
    }

    #[test]
    fn test_charge_applies_exactly_once() {
        let mut store = store_of(20);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut bus = ImpulseBus::new();
        let pinned = vec![false; 20];
        bus.trigger_charge();

        let report = bus.apply(&mut store, 0.0, 1.0, &quiet(), &mut rng, &pinned);
        assert_eq!(report.charges, 1);
        assert!(store
            .velocities
            .iter()
            .all(|v| v.length() >= 5.0 - 1e-4 && v.length() <= 15.0 + 1e-4));

        let before = store.velocities.clone();
        let report = bus.apply(&mut store, 16.0, 1.0, &quiet(), &mut rng, &pinned);
        assert_eq!(report.charges, 0);
        assert_eq!(store.velocities, before);
    }

    #[test]
    fn test_pinned_receive_nothing() {
        let mut store = store_of(2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut bus = ImpulseBus::new();
        bus.set_shock(true);
        bus.trigger_charge();

        bus.apply(&mut store, 10.0, 1.0, &ImpulseConfig::default(), &mut rng, &[true, false]);

        assert_eq!(store.velocities[0], Vec2::ZERO);
        assert_ne!(store.velocities[1], Vec2::ZERO);
    }
}
