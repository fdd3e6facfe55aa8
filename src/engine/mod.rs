//! Engine - owns every simulation component and exposes the command surface
//!
//! Collaborators (renderers, UIs, the CLI runner) never touch particle storage
//! directly. They issue commands and read the `RenderSnapshot` republished
//! after every tick and every mutating command.

pub mod snapshot;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::EngineConfig;
use crate::core::error::{EngineError, Result};
use crate::core::types::{GroupId, ParticleId, Tick, Vec2};
use crate::entity::group::{Group, GroupRegistry, GroupStyle};
use crate::entity::particle::{ParticleStore, ParticleTunables};
use crate::rules::matrix::RuleMatrix;
use crate::rules::scenario::Scenario;
use crate::simulation::boundary::Boundary;
use crate::simulation::clock::{ClockState, SimulationClock, SpeedPreset};
use crate::simulation::grab::GrabState;
use crate::simulation::impulse::ImpulseBus;
use crate::simulation::tick::{run_simulation_tick, TickReport};

pub use snapshot::{ParticleView, RenderInstance, RenderSnapshot};

pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) store: ParticleStore,
    pub(crate) groups: GroupRegistry,
    pub(crate) rules: RuleMatrix,
    pub(crate) clock: SimulationClock,
    pub(crate) impulses: ImpulseBus,
    pub(crate) grab: GrabState,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) tick: Tick,
    next_particle_id: u32,
    snapshot: RenderSnapshot,
}

impl Engine {
    /// Build an engine; an invalid configuration aborts construction
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(seed = config.seed, boundary = ?config.boundary.shape, "Engine created");
        Ok(Self {
            clock: SimulationClock::new(&config.clock),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            store: ParticleStore::new(),
            groups: GroupRegistry::new(),
            rules: RuleMatrix::new(),
            impulses: ImpulseBus::new(),
            grab: GrabState::new(),
            tick: 0,
            next_particle_id: 0,
            snapshot: RenderSnapshot::default(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    pub fn living_count(&self) -> usize {
        self.store.living_count()
    }

    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> Result<&Group> {
        self.groups.get(id).ok_or(EngineError::UnknownGroup(id))
    }

    pub fn rules(&self) -> &RuleMatrix {
        &self.rules
    }

    pub fn clock_state(&self) -> ClockState {
        self.clock.state()
    }

    pub fn speed(&self) -> f32 {
        self.clock.speed()
    }

    pub fn shock_active(&self) -> bool {
        self.impulses.shock_active()
    }

    pub fn is_grabbing(&self) -> bool {
        self.grab.is_active()
    }

    /// Render state as of the last tick or command
    pub fn snapshot(&self) -> &RenderSnapshot {
        &self.snapshot
    }

    pub fn particle(&self, id: ParticleId) -> Option<ParticleView> {
        let index = self.store.index_of(id)?;
        self.store.alive[index].then(|| ParticleView::from_store(&self.store, index))
    }

    pub fn tick(&mut self, now_ms: f64) -> TickReport {
        run_simulation_tick(self, now_ms)
    }

    // === GROUPS & SPAWNING ===

    /// Create an empty, addressable group
    pub fn create_group(
        &mut self,
        name: impl Into<String>,
        style: GroupStyle,
        defaults: ParticleTunables,
    ) -> Result<GroupId> {
        defaults.validate()?;
        validate_style(&style)?;
        let name = name.into();
        let id = self.groups.create(name.clone(), style, defaults);
        tracing::debug!(group = %id, name = %name, "Group created");
        Ok(id)
    }

    /// Create a group and fill it with `count` particles at random positions
    pub fn spawn_group(
        &mut self,
        count: usize,
        style: GroupStyle,
        tunables: ParticleTunables,
    ) -> Result<GroupId> {
        let name = format!("group-{}", self.groups.len());
        let id = self.create_group(name, style, tunables)?;
        self.spawn_into_group(id, count)?;
        Ok(id)
    }

    /// Add `count` particles with the group defaults at random positions
    pub fn spawn_into_group(&mut self, group: GroupId, count: usize) -> Result<Vec<ParticleId>> {
        let defaults = self.group(group)?.defaults;
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let position = self.config.boundary.random_point(&mut self.rng);
            ids.push(self.insert_particle(group, position, defaults));
        }
        tracing::debug!(group = %group, count, "Spawned particles");
        self.publish();
        Ok(ids)
    }

    /// Add one particle at `position`; `tunables` overrides the group defaults
    pub fn spawn_particle(
        &mut self,
        group: GroupId,
        position: Vec2,
        tunables: Option<ParticleTunables>,
    ) -> Result<ParticleId> {
        let defaults = self.group(group)?.defaults;
        let tunables = tunables.unwrap_or(defaults);
        tunables.validate()?;
        if !position.is_finite() {
            return Err(EngineError::InvalidConfig(format!(
                "spawn position must be finite, got {:?}",
                position
            )));
        }
        let id = self.insert_particle(group, position, tunables);
        tracing::debug!(particle = %id, group = %group, "Spawned particle");
        self.publish();
        Ok(id)
    }

    fn insert_particle(&mut self, group: GroupId, position: Vec2, tunables: ParticleTunables) -> ParticleId {
        let id = ParticleId(self.next_particle_id);
        self.next_particle_id += 1;

        let style = self.groups.get(group).map(|g| g.style).unwrap_or_default();
        self.store.spawn(id, group, position, style.color, style.opacity, tunables);
        if let Some(entry) = self.groups.get_mut(group) {
            entry.members.push(id);
        }
        id
    }

    /// Remove every particle; groups and rules stay
    pub fn remove_all(&mut self) {
        let removed = self.store.living_count();
        self.store.clear();
        self.groups.clear_members();
        self.grab.clear();
        tracing::debug!(removed, "Removed all particles");
        self.publish();
    }

    // === RULES ===

    pub fn set_rule(&mut self, a: GroupId, b: GroupId, coefficient: f32) -> Result<()> {
        for id in [a, b] {
            if !self.groups.contains(id) {
                return Err(EngineError::UnknownGroup(id));
            }
        }
        self.rules.set(a, b, coefficient)?;
        tracing::debug!(from = %a, to = %b, coefficient, "Rule set");
        Ok(())
    }

    /// Replace the matrix with uniform random coefficients in `[-spread, spread)`
    pub fn randomize_rules(&mut self, spread: f32) {
        let ids: Vec<GroupId> = self.groups.ids().collect();
        self.rules.randomize(&ids, spread, &mut self.rng);
        tracing::debug!(groups = ids.len(), spread, "Rules randomized");
    }

    // === CLOCK ===

    pub fn set_speed(&mut self, value: f32) -> Result<()> {
        self.clock.set_speed(value)?;
        tracing::debug!(speed = value, state = ?self.clock.state(), "Speed set");
        Ok(())
    }

    pub fn set_speed_preset(&mut self, preset: SpeedPreset) {
        self.clock.set_preset(preset);
        tracing::debug!(?preset, speed = self.clock.speed(), "Speed preset");
    }

    /// Freeze all dynamics; also releases a held shock
    pub fn pause(&mut self) {
        self.clock.pause();
        self.impulses.set_shock(false);
        tracing::info!(tick = self.tick, "Paused");
    }

    pub fn resume(&mut self) {
        self.clock.resume();
        tracing::info!(tick = self.tick, speed = self.clock.speed(), "Resumed");
    }

    // === IMPULSES ===

    /// Hold or release the shock; holding is refused while paused
    pub fn trigger_shock(&mut self, active: bool) {
        if active && self.clock.is_paused() {
            tracing::debug!(tick = self.tick, "Shock ignored while paused");
            return;
        }
        self.impulses.set_shock(active);
        tracing::debug!(active, "Shock");
    }

    pub fn trigger_electric_charge(&mut self) {
        self.impulses.trigger_charge();
        tracing::debug!(pending = self.impulses.pending_charges(), "Electric charge queued");
    }

    // === GRAB ===

    /// Grab every particle within its grab radius of `cursor`
    pub fn begin_grab(&mut self, cursor: Vec2) -> Vec<ParticleId> {
        let grabbed = self.grab.begin(&mut self.store, cursor);
        tracing::debug!(count = grabbed.len(), "Grab started");
        self.publish();
        grabbed
    }

    pub fn update_grab_target(&mut self, cursor: Vec2) {
        self.grab.update_target(&mut self.store, cursor);
        self.publish();
    }

    pub fn end_grab(&mut self) {
        self.grab.end(&mut self.store);
        tracing::debug!("Grab released");
        self.publish();
    }

    // === RESETS ===

    /// Switch the containment policy; clears the population
    pub fn reset_boundary(&mut self, boundary: Boundary) -> Result<()> {
        boundary.validate()?;
        self.remove_all();
        self.config.boundary = boundary;
        tracing::info!(shape = ?boundary.shape, response = ?boundary.response, "Boundary reset");
        Ok(())
    }

    /// Replace groups, particles and rules with a scenario
    ///
    /// Validation happens first, so a bad scenario leaves the engine untouched.
    /// Groups from before the load are retired: their ids answer
    /// `UnknownGroup` and the new groups get fresh ids.
    pub fn load_scenario(&mut self, scenario: &Scenario) -> Result<Vec<GroupId>> {
        scenario.validate()?;

        self.store.clear();
        self.groups.clear();
        self.rules.clear();
        self.grab.clear();

        let mut ids = Vec::with_capacity(scenario.groups.len());
        for spec in &scenario.groups {
            let id = self.groups.create(spec.name.clone(), spec.style, spec.tunables);
            for _ in 0..spec.count {
                let position = self.config.boundary.random_point(&mut self.rng);
                self.insert_particle(id, position, spec.tunables);
            }
            ids.push(id);
        }

        for rule in &scenario.rules {
            let (Some(a), Some(b)) = (scenario.group_index(&rule.from), scenario.group_index(&rule.to)) else {
                continue;
            };
            self.rules.set(ids[a], ids[b], rule.coefficient)?;
        }

        tracing::info!(
            scenario = %scenario.name,
            groups = ids.len(),
            particles = scenario.total_particles(),
            rules = self.rules.len(),
            "Scenario loaded"
        );
        self.publish();
        Ok(ids)
    }

    pub(crate) fn publish(&mut self) {
        self.snapshot = RenderSnapshot::capture(&self.store, self.tick);
    }
}

fn validate_style(style: &GroupStyle) -> Result<()> {
    if !(0.0..=1.0).contains(&style.opacity) {
        return Err(EngineError::InvalidConfig(format!(
            "group opacity must be in [0, 1], got {}",
            style.opacity
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Color;

    fn engine() -> Engine {
        Engine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_config_aborts_construction() {
        let mut config = EngineConfig::default();
        config.clock.base_speed = -1.0;
        assert!(Engine::new(config).is_err());
    }

    #[test]
    fn test_spawn_group_inside_boundary() {
        let mut engine = engine();
        let group = engine
            .spawn_group(25, GroupStyle::new(Color(0x00ff00)), ParticleTunables::default())
            .unwrap();

        assert_eq!(engine.group(group).unwrap().len(), 25);
        assert_eq!(engine.snapshot().len(), 25);
        for view in &engine.snapshot().particles {
            assert!(view.position.distance(Vec2::new(200.0, 200.0)) <= 200.0 + 1e-3);
            assert_eq!(view.color, Color(0x00ff00));
        }
    }

    #[test]
    fn test_unknown_group_commands_fail_cleanly() {
        let mut engine = engine();
        let a = engine.create_group("a", GroupStyle::default(), ParticleTunables::default()).unwrap();

        assert!(matches!(
            engine.set_rule(a, GroupId(9), 0.1),
            Err(EngineError::UnknownGroup(GroupId(9)))
        ));
        assert!(matches!(
            engine.spawn_particle(GroupId(9), Vec2::ZERO, None),
            Err(EngineError::UnknownGroup(_))
        ));
        assert!(matches!(
            engine.spawn_particle(GroupId(9), Vec2::ZERO, Some(ParticleTunables::default())),
            Err(EngineError::UnknownGroup(_))
        ));
        assert_eq!(engine.living_count(), 0);
        assert!(engine.rules().is_empty());
    }

    #[test]
    fn test_non_finite_rule_rejected() {
        let mut engine = engine();
        let a = engine.create_group("a", GroupStyle::default(), ParticleTunables::default()).unwrap();
        engine.set_rule(a, a, 0.2).unwrap();

        assert!(engine.set_rule(a, a, f32::NAN).is_err());
        assert_eq!(engine.rules().get(a, a), 0.2);
    }

    #[test]
    fn test_invalid_tunables_rejected() {
        let mut engine = engine();
        let a = engine.create_group("a", GroupStyle::default(), ParticleTunables::default()).unwrap();
        let bad = ParticleTunables::default().with_size(-1.0);

        assert!(matches!(
            engine.spawn_particle(a, Vec2::ZERO, Some(bad)),
            Err(EngineError::InvalidTunables(_))
        ));
        assert!(engine.create_group("b", GroupStyle::default(), bad).is_err());
    }

    #[test]
    fn test_remove_all_keeps_groups() {
        let mut engine = engine();
        let a = engine
            .spawn_group(10, GroupStyle::default(), ParticleTunables::default())
            .unwrap();

        engine.remove_all();

        assert_eq!(engine.living_count(), 0);
        assert!(engine.snapshot().is_empty());
        assert!(engine.group(a).unwrap().is_empty());
        assert!(engine.spawn_particle(a, Vec2::new(200.0, 200.0), None).is_ok());
    }

    #[test]
    fn test_particle_ids_never_reused() {
        let mut engine = engine();
        let a = engine.create_group("a", GroupStyle::default(), ParticleTunables::default()).unwrap();
        let first = engine.spawn_particle(a, Vec2::ZERO, None).unwrap();
        engine.remove_all();
        let second = engine.spawn_particle(a, Vec2::ZERO, None).unwrap();
        assert_ne!(first, second);
        assert!(engine.particle(first).is_none());
        assert!(engine.particle(second).is_some());
    }

    #[test]
    fn test_pause_clears_shock() {
        let mut engine = engine();
        engine.trigger_shock(true);
        engine.pause();
        assert!(!engine.shock_active());
        assert_eq!(engine.clock_state(), ClockState::Paused);
    }

    #[test]
    fn test_shock_ignored_while_paused() {
        let mut engine = engine();
        engine
            .spawn_group(10, GroupStyle::default(), ParticleTunables::default())
            .unwrap();
        engine.pause();

        engine.trigger_shock(true);
        assert!(!engine.shock_active());

        engine.resume();
        let report = engine.tick(0.0);
        assert!(report.advanced);
        assert!(!report.impulses.shocked);

        engine.trigger_shock(true);
        assert!(engine.shock_active());
    }

    #[test]
    fn test_old_group_ids_unknown_after_load() {
        let mut engine = engine();
        let old = engine
            .spawn_group(5, GroupStyle::default(), ParticleTunables::default())
            .unwrap();

        let ids = engine.load_scenario(&Scenario::classic(4)).unwrap();

        assert!(!ids.contains(&old));
        assert!(matches!(engine.group(old), Err(EngineError::UnknownGroup(id)) if id == old));
        assert!(matches!(
            engine.set_rule(old, ids[0], 0.2),
            Err(EngineError::UnknownGroup(_))
        ));
        assert!(matches!(
            engine.spawn_particle(old, Vec2::ZERO, None),
            Err(EngineError::UnknownGroup(_))
        ));
        assert_eq!(engine.living_count(), 12);
        for id in &ids {
            assert_eq!(engine.group(*id).unwrap().len(), 4);
        }
    }

    #[test]
    fn test_load_scenario_replaces_everything() {
        let mut engine = engine();
        engine
            .spawn_group(5, GroupStyle::default(), ParticleTunables::default())
            .unwrap();

        let ids = engine.load_scenario(&Scenario::classic(10)).unwrap();

        assert_eq!(ids.len(), 3);
        assert_eq!(engine.groups().len(), 3);
        assert_eq!(engine.living_count(), 30);
        assert_eq!(engine.rules().len(), 7);
        let green = engine.groups().find_by_name("green").unwrap();
        let yellow = engine.groups().find_by_name("yellow").unwrap();
        assert_eq!(engine.rules().get(green, yellow), -0.34);
    }

    #[test]
    fn test_reset_boundary_clears_population() {
        let mut engine = engine();
        engine
            .spawn_group(5, GroupStyle::default(), ParticleTunables::default())
            .unwrap();
        let rect = Boundary::rect(
            Vec2::ZERO,
            Vec2::new(50.0, 50.0),
            crate::simulation::boundary::BoundaryResponse::Reflect,
        );

        engine.reset_boundary(rect).unwrap();

        assert_eq!(engine.living_count(), 0);
        assert_eq!(engine.config().boundary, rect);
    }
}
