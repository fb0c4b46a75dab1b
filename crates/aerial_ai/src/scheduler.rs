//! Fixed-interval driver for every aerial creature.
//!
//! [`AerialScheduler`] owns all process-wide state: the spatial cache, the
//! target memo, per-entity runtime state and the lifetime break ledger. A host
//! calls [`AerialScheduler::tick`] once per game tick; every `interval`-th call
//! runs a full pass:
//!
//! 1. refresh the player cache,
//! 2. per dimension, skip entirely when no player is in it,
//! 3. per configured creature type, enumerate, drop invalid entities and cull
//!    anything outside the processing radius of every player,
//! 4. dispatch survivors through the flyer or torpedo pipeline,
//! 5. prune per-entity state to exactly the entities seen this pass.

use crate::config::{AiConfig, CreatureKind, FlightRole};
use crate::debug::{trace_ai, DebugFlags};
use crate::flyer::{run_flyer, FlyerState};
use crate::spatial_cache::SpatialCache;
use crate::target::TargetResolver;
use crate::terrain::{LifetimeLedger, TerrainEngine};
use crate::torpedo::{run_torpedo, TorpedoState};
use engine_core::{EntityId, TickClock};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use voxel::{EntitySnapshot, WorldAccess};

/// Everything a behavior pipeline may touch while processing one entity.
pub struct BehaviorContext<'a> {
    pub world: &'a mut dyn WorldAccess,
    pub spatial: &'a mut SpatialCache,
    pub targets: &'a mut TargetResolver,
    pub terrain: &'a TerrainEngine,
    pub ledger: &'a mut LifetimeLedger,
    pub clock: &'a TickClock,
    pub rng: &'a mut StdRng,
    pub debug: &'a DebugFlags,
    pub tick: u64,
}

/// Summary of one scheduler pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    /// Dimensions skipped because no player was in them.
    pub partitions_skipped: u32,
    pub processed: u32,
    pub culled: u32,
    pub blocks_broken: u32,
    pub detonations: u32,
    pub dives_started: u32,
    pub dives_ended: u32,
    /// Per-entity state entries removed by cleanup.
    pub pruned: usize,
}

/// Owns and drives the aerial AI.
pub struct AerialScheduler {
    config: AiConfig,
    clock: TickClock,
    spatial: SpatialCache,
    targets: TargetResolver,
    terrain: TerrainEngine,
    ledger: LifetimeLedger,
    roles: HashMap<EntityId, FlightRole>,
    flyers: HashMap<EntityId, FlyerState>,
    torpedoes: HashMap<EntityId, TorpedoState>,
    rng: StdRng,
}

impl AerialScheduler {
    pub fn new(config: AiConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic scheduler for tests and replayable runs.
    pub fn with_seed(config: AiConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut config: AiConfig, rng: StdRng) -> Self {
        config.sanitize();
        let s = config.scheduler;
        let spatial = SpatialCache::new(s.player_cache_ticks, s.mob_cache_ticks, config.target_families.clone());
        let targets = TargetResolver::new(s.target_cache_ticks, s.mob_search_factor);
        let terrain = TerrainEngine::new(
            config.indestructible.iter().copied(),
            config.break_sounds.clone(),
            config.default_break_sound.clone(),
        );
        log::info!(
            "Aerial scheduler: {} creature types, every {} ticks, radius {}",
            config.creatures.len(),
            s.interval,
            s.processing_radius
        );
        Self {
            clock: TickClock::new(s.interval),
            spatial,
            targets,
            terrain,
            ledger: LifetimeLedger::default(),
            roles: HashMap::new(),
            flyers: HashMap::new(),
            torpedoes: HashMap::new(),
            rng,
            config,
        }
    }

    /// Observe game tick `game_tick`; runs a pass on interval ticks.
    pub fn tick(&mut self, world: &mut dyn WorldAccess, game_tick: u64) -> Option<TickReport> {
        if !self.clock.should_run(game_tick) {
            return None;
        }
        Some(self.run_pass(world, game_tick))
    }

    fn run_pass(&mut self, world: &mut dyn WorldAccess, tick: u64) -> TickReport {
        let mut report = TickReport {
            tick,
            ..Default::default()
        };
        let mut seen: HashSet<EntityId> = HashSet::new();
        let radius = self.config.scheduler.processing_radius;
        let radius_sq = radius * radius;

        self.spatial.players(&*world, tick);
        let dimensions = world.dimensions();
        self.spatial.retain_dimensions(&dimensions);
        let creatures = self.config.creatures.clone();

        for dimension in &dimensions {
            let players: Vec<Vec3> = self.spatial.player_positions(dimension).to_vec();
            if players.is_empty() {
                report.partitions_skipped += 1;
                continue;
            }
            for spec in &creatures {
                let entities = match world.entities_of_type(dimension, &spec.type_id) {
                    Ok(entities) => entities,
                    Err(e) => {
                        log::debug!("Skipping {} in {}: {}", spec.type_id, dimension, e);
                        continue;
                    }
                };
                for entity in entities {
                    if !entity.valid {
                        continue;
                    }
                    let near = players
                        .iter()
                        .any(|p| p.distance_squared(entity.position) <= radius_sq);
                    if !near {
                        report.culled += 1;
                        continue;
                    }
                    seen.insert(entity.id);
                    self.dispatch(world, &entity, spec.kind, tick, &mut report);
                    report.processed += 1;
                }
            }
        }

        report.pruned = self.cleanup(&*world, &seen, tick);
        trace_ai!(
            self.config.debug,
            "scheduler",
            "pass",
            "Pass at tick {}: {} processed, {} culled, {} pruned",
            tick,
            report.processed,
            report.culled,
            report.pruned
        );
        report
    }

    fn dispatch(
        &mut self,
        world: &mut dyn WorldAccess,
        entity: &EntitySnapshot,
        kind: CreatureKind,
        tick: u64,
        report: &mut TickReport,
    ) {
        match kind {
            CreatureKind::Flying(cfg) => {
                let rng = &mut self.rng;
                let role = *self.roles.entry(entity.id).or_insert_with(|| {
                    if rng.gen_bool(cfg.high_profile_chance) {
                        FlightRole::HighProfile
                    } else {
                        FlightRole::LowProfile
                    }
                });
                let state = self.flyers.entry(entity.id).or_default();
                let mut ctx = BehaviorContext {
                    world,
                    spatial: &mut self.spatial,
                    targets: &mut self.targets,
                    terrain: &self.terrain,
                    ledger: &mut self.ledger,
                    clock: &self.clock,
                    rng: &mut self.rng,
                    debug: &self.config.debug,
                    tick,
                };
                run_flyer(&mut ctx, entity, &cfg, role, state);
            }
            CreatureKind::Torpedo(cfg) => {
                let state = self.torpedoes.entry(entity.id).or_default();
                let mut ctx = BehaviorContext {
                    world,
                    spatial: &mut self.spatial,
                    targets: &mut self.targets,
                    terrain: &self.terrain,
                    ledger: &mut self.ledger,
                    clock: &self.clock,
                    rng: &mut self.rng,
                    debug: &self.config.debug,
                    tick,
                };
                let outcome = run_torpedo(&mut ctx, entity, &cfg, state);
                report.blocks_broken += outcome.blocks_broken;
                report.detonations += u32::from(outcome.detonated);
                report.dives_started += u32::from(outcome.dive_entered);
                report.dives_ended += u32::from(outcome.dive_ended);
            }
        }
    }

    /// Prune per-entity maps to `seen`; on the coarse cadence also drop memo
    /// and ledger entries for entities the world no longer has.
    fn cleanup(&mut self, world: &dyn WorldAccess, seen: &HashSet<EntityId>, tick: u64) -> usize {
        let before = self.roles.len() + self.flyers.len() + self.torpedoes.len();
        self.roles.retain(|id, _| seen.contains(id));
        self.flyers.retain(|id, _| seen.contains(id));
        self.torpedoes.retain(|id, _| seen.contains(id));
        let mut pruned = before - (self.roles.len() + self.flyers.len() + self.torpedoes.len());
        pruned += self.targets.retain_actors(seen);

        if self.clock.is_window_start(tick, self.config.scheduler.cleanup_interval) {
            pruned += self.targets.verify_live(world);
            pruned += self.ledger.retain_live(world);
        }
        pruned
    }

    /// Drop all state. The scheduler can keep running afterwards and will
    /// rebuild everything from the world.
    pub fn shutdown(&mut self) {
        log::info!(
            "Aerial scheduler shutting down ({} entities tracked)",
            self.tracked_count()
        );
        self.roles.clear();
        self.flyers.clear();
        self.torpedoes.clear();
        self.targets.clear();
        self.ledger.clear();
        self.spatial.invalidate();
    }

    pub fn role_of(&self, id: EntityId) -> Option<FlightRole> {
        self.roles.get(&id).copied()
    }

    pub fn flyer_state(&self, id: EntityId) -> Option<&FlyerState> {
        self.flyers.get(&id)
    }

    pub fn torpedo_state(&self, id: EntityId) -> Option<&TorpedoState> {
        self.torpedoes.get(&id)
    }

    pub fn break_count(&self, id: EntityId) -> u32 {
        self.ledger.breaks(id)
    }

    /// Entities with live runtime state.
    pub fn tracked_count(&self) -> usize {
        self.flyers.len() + self.torpedoes.len()
    }
}
