//! Destructive tunnelling for torpedoes and the lifetime break ledger.

use crate::config::{SoundGroup, TorpedoConfig};
use crate::detonation::self_destruct;
use engine_core::EntityId;
use glam::IVec3;
use std::collections::{HashMap, HashSet};
use voxel::{block_center, BlockId, EntitySnapshot, WorldAccess};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LedgerEntry {
    breaks: u32,
    detonated: bool,
}

/// Per-torpedo lifetime break counts. Counts only ever go up.
#[derive(Debug, Default)]
pub struct LifetimeLedger {
    entries: HashMap<EntityId, LedgerEntry>,
}

impl LifetimeLedger {
    pub fn breaks(&self, id: EntityId) -> u32 {
        self.entries.get(&id).map_or(0, |e| e.breaks)
    }

    pub fn record_break(&mut self, id: EntityId) -> u32 {
        let entry = self.entries.entry(id).or_default();
        entry.breaks = entry.breaks.saturating_add(1);
        entry.breaks
    }

    pub fn is_detonated(&self, id: EntityId) -> bool {
        self.entries.get(&id).is_some_and(|e| e.detonated)
    }

    /// Mark `id` as detonated. True only the first time.
    pub fn mark_detonated(&mut self, id: EntityId) -> bool {
        let entry = self.entries.entry(id).or_default();
        !std::mem::replace(&mut entry.detonated, true)
    }

    /// Drop entries for entities the world reports as gone. A lookup that
    /// fails for any other reason keeps the entry.
    pub fn retain_live(&mut self, world: &dyn WorldAccess) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|id, _| !matches!(world.entity(*id), Err(e) if e.is_invalid_entity()));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What one destructive scan did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BreakReport {
    pub broken: u32,
    pub detonated: bool,
}

impl BreakReport {
    fn absorb(&mut self, other: BreakReport) {
        self.broken += other.broken;
        self.detonated |= other.detonated;
    }
}

/// Scan offsets for a cube of half-width `radius` around the origin, minus the
/// origin itself: highest layer first, then nearest column first.
pub fn neighborhood(radius: i32) -> Vec<IVec3> {
    let r = radius.max(0);
    let mut offsets = Vec::with_capacity(((2 * r + 1).pow(3) - 1) as usize);
    for dy in -r..=r {
        for dz in -r..=r {
            for dx in -r..=r {
                if dx != 0 || dy != 0 || dz != 0 {
                    offsets.push(IVec3::new(dx, dy, dz));
                }
            }
        }
    }
    offsets.sort_by_key(|o| (-o.y, o.x.abs() + o.z.abs()));
    offsets
}

/// Block destruction rules shared by every torpedo.
#[derive(Debug, Clone)]
pub struct TerrainEngine {
    indestructible: HashSet<BlockId>,
    break_sounds: Vec<SoundGroup>,
    default_sound: String,
}

impl TerrainEngine {
    pub fn new(indestructible: impl IntoIterator<Item = BlockId>, break_sounds: Vec<SoundGroup>, default_sound: String) -> Self {
        Self {
            indestructible: indestructible.into_iter().collect(),
            break_sounds,
            default_sound,
        }
    }

    pub fn indestructible(&self) -> &HashSet<BlockId> {
        &self.indestructible
    }

    pub fn is_breakable(&self, block: BlockId) -> bool {
        !block.is_air() && !self.indestructible.contains(&block)
    }

    /// First sound group with a keyword contained in the block name.
    pub fn break_sound_for(&self, block: BlockId) -> &str {
        let name = block.name();
        self.break_sounds
            .iter()
            .find(|group| group.keywords.iter().any(|k| name.contains(k.as_str())))
            .map_or(self.default_sound.as_str(), |group| group.sound.as_str())
    }

    /// Break the scan neighborhood around `actor`, up to the per-tick budget.
    /// Self-destructs as soon as the lifetime budget is reached.
    pub fn scan_and_break(
        &self,
        world: &mut dyn WorldAccess,
        actor: &EntitySnapshot,
        cfg: &TorpedoConfig,
        ledger: &mut LifetimeLedger,
    ) -> BreakReport {
        let origin = actor.block_pos();
        let cells: Vec<IVec3> = neighborhood(cfg.structure_scan_radius)
            .into_iter()
            .map(|o| origin + o)
            .collect();
        self.break_cells(world, actor, cfg, ledger, &cells, cfg.blocks_per_tick)
    }

    /// Break straight up from the block above `actor`, at most `limit` blocks.
    pub fn break_blocks_above(
        &self,
        world: &mut dyn WorldAccess,
        actor: &EntitySnapshot,
        cfg: &TorpedoConfig,
        ledger: &mut LifetimeLedger,
        limit: i32,
    ) -> BreakReport {
        let origin = actor.block_pos();
        let cells: Vec<IVec3> = (1..=limit.max(0)).map(|dy| origin + IVec3::new(0, dy, 0)).collect();
        let budget = cfg.blocks_per_tick.min(limit.max(0) as u32);
        self.break_cells(world, actor, cfg, ledger, &cells, budget)
    }

    fn break_cells(
        &self,
        world: &mut dyn WorldAccess,
        actor: &EntitySnapshot,
        cfg: &TorpedoConfig,
        ledger: &mut LifetimeLedger,
        cells: &[IVec3],
        budget: u32,
    ) -> BreakReport {
        let mut report = BreakReport::default();
        if ledger.is_detonated(actor.id) {
            return report;
        }
        let floor = cfg.min_y.floor() as i32;
        for &cell in cells {
            if report.broken >= budget {
                break;
            }
            if cell.y < floor {
                continue;
            }
            let block = match world.block(&actor.dimension, cell) {
                Ok(block) => block,
                Err(_) => continue,
            };
            if !self.is_breakable(block) {
                continue;
            }
            // A spent torpedo never breaks again.
            if ledger.breaks(actor.id) >= cfg.max_blocks {
                report.absorb(self.exhausted(world, actor, cfg, ledger));
                return report;
            }
            if world.set_block(&actor.dimension, cell, BlockId::Air).is_err() {
                continue;
            }
            let sound = self.break_sound_for(block);
            let _ = world.play_sound(&actor.dimension, block_center(cell), sound, 1.0, 1.0);
            report.broken += 1;
            log::trace!("{} broke {} at {}", actor.id, block.name(), cell);

            if ledger.record_break(actor.id) >= cfg.max_blocks {
                report.absorb(self.exhausted(world, actor, cfg, ledger));
                return report;
            }
        }
        report
    }

    fn exhausted(
        &self,
        world: &mut dyn WorldAccess,
        actor: &EntitySnapshot,
        cfg: &TorpedoConfig,
        ledger: &mut LifetimeLedger,
    ) -> BreakReport {
        if !ledger.mark_detonated(actor.id) {
            return BreakReport::default();
        }
        log::info!(
            "{} spent its destruction budget ({} blocks), self-destructing",
            actor.id,
            ledger.breaks(actor.id)
        );
        self_destruct(world, actor, cfg.scar_radius);
        BreakReport {
            broken: 0,
            detonated: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AiConfig;
    use engine_core::DimensionId;
    use glam::Vec3;
    use voxel::SimWorld;

    fn engine() -> TerrainEngine {
        let config = AiConfig::default();
        TerrainEngine::new(config.indestructible, config.break_sounds, config.default_break_sound)
    }

    fn torpedo_in_stone(world: &mut SimWorld) -> EntitySnapshot {
        let dim = DimensionId::overworld();
        world.fill_box(&dim, IVec3::new(-3, 60, -3), IVec3::new(3, 66, 3), BlockId::Stone);
        let id = world.spawn_creature("sky_torpedo", "monster", &dim, Vec3::new(0.5, 63.5, 0.5));
        world.put_block(&dim, IVec3::new(0, 63, 0), BlockId::Air);
        world.entity(id).unwrap()
    }

    #[test]
    fn neighborhood_prefers_above_then_near() {
        let offsets = neighborhood(1);
        assert_eq!(offsets.len(), 26);
        assert_eq!(offsets[0], IVec3::new(0, 1, 0));
        assert!(offsets[..9].iter().all(|o| o.y == 1));
        assert!(offsets[9..17].iter().all(|o| o.y == 0));
        assert_eq!(offsets[25].y, -1);
    }

    #[test]
    fn break_sounds_by_keyword() {
        let engine = engine();
        assert_eq!(engine.break_sound_for(BlockId::Glass), "block.glass.break");
        assert_eq!(engine.break_sound_for(BlockId::OakPlanks), "block.wood.break");
        assert_eq!(engine.break_sound_for(BlockId::GrassBlock), "block.grass.break");
        assert_eq!(engine.break_sound_for(BlockId::Stone), "block.stone.break");
    }

    #[test]
    fn per_tick_budget_and_priority() {
        let mut world = SimWorld::new();
        let actor = torpedo_in_stone(&mut world);
        let dim = actor.dimension.clone();
        let cfg = TorpedoConfig::default();
        let mut ledger = LifetimeLedger::default();

        let report = engine().scan_and_break(&mut world, &actor, &cfg, &mut ledger);
        assert_eq!(report.broken, cfg.blocks_per_tick);
        assert!(!report.detonated);
        assert_eq!(ledger.breaks(actor.id), cfg.blocks_per_tick);
        assert_eq!(world.block_at(&dim, IVec3::new(0, 64, 0)), BlockId::Air);
        assert_eq!(world.block_at(&dim, IVec3::new(0, 62, 0)), BlockId::Stone);
        assert_eq!(world.journal().sounds_named("block.stone.break").count(), 4);
    }

    #[test]
    fn indestructible_and_floor_are_skipped() {
        let mut world = SimWorld::new();
        let dim = DimensionId::overworld();
        world.fill_box(&dim, IVec3::new(-1, 38, -1), IVec3::new(1, 40, 1), BlockId::Bedrock);
        world.put_block(&dim, IVec3::new(0, 38, 0), BlockId::Stone);
        let id = world.spawn_creature("sky_torpedo", "monster", &dim, Vec3::new(0.5, 39.5, 0.5));
        world.put_block(&dim, IVec3::new(0, 39, 0), BlockId::Air);
        let actor = world.entity(id).unwrap();
        let mut ledger = LifetimeLedger::default();

        let report = engine().scan_and_break(&mut world, &actor, &TorpedoConfig::default(), &mut ledger);
        assert_eq!(report.broken, 0);
        assert_eq!(world.block_at(&dim, IVec3::new(0, 38, 0)), BlockId::Stone);
    }

    #[test]
    fn exhausted_budget_detonates_exactly_once() {
        let mut world = SimWorld::new();
        let actor = torpedo_in_stone(&mut world);
        let cfg = TorpedoConfig {
            max_blocks: 50,
            ..Default::default()
        };
        let mut ledger = LifetimeLedger::default();
        for _ in 0..50 {
            ledger.record_break(actor.id);
        }

        let report = engine().scan_and_break(&mut world, &actor, &cfg, &mut ledger);
        assert_eq!(report.broken, 0);
        assert!(report.detonated);
        assert_eq!(ledger.breaks(actor.id), 50);
        assert_eq!(world.journal().removed, vec![actor.id]);

        let again = engine().scan_and_break(&mut world, &actor, &cfg, &mut ledger);
        assert_eq!(again, BreakReport::default());
        assert_eq!(world.journal().sounds_named("entity.generic.explode").count(), 1);
    }

    #[test]
    fn reaching_budget_mid_scan_stops_immediately() {
        let mut world = SimWorld::new();
        let actor = torpedo_in_stone(&mut world);
        let cfg = TorpedoConfig {
            max_blocks: 2,
            ..Default::default()
        };
        let mut ledger = LifetimeLedger::default();
        let report = engine().scan_and_break(&mut world, &actor, &cfg, &mut ledger);
        assert_eq!(report.broken, 2);
        assert!(report.detonated);
        assert_eq!(ledger.breaks(actor.id), 2);
    }

    #[test]
    fn directed_breaking_goes_straight_up() {
        let mut world = SimWorld::new();
        let actor = torpedo_in_stone(&mut world);
        let dim = actor.dimension.clone();
        let mut ledger = LifetimeLedger::default();
        let report = engine().break_blocks_above(&mut world, &actor, &TorpedoConfig::default(), &mut ledger, 2);
        assert_eq!(report.broken, 2);
        assert_eq!(world.block_at(&dim, IVec3::new(0, 64, 0)), BlockId::Air);
        assert_eq!(world.block_at(&dim, IVec3::new(0, 65, 0)), BlockId::Air);
        assert_eq!(world.block_at(&dim, IVec3::new(0, 66, 0)), BlockId::Stone);
        assert_eq!(world.block_at(&dim, IVec3::new(1, 64, 0)), BlockId::Stone);
    }

    #[test]
    fn ledger_pruned_by_liveness() {
        let mut world = SimWorld::new();
        let actor = torpedo_in_stone(&mut world);
        let mut ledger = LifetimeLedger::default();
        ledger.record_break(actor.id);
        assert_eq!(ledger.retain_live(&world), 0);
        world.despawn(actor.id);
        assert_eq!(ledger.retain_live(&world), 1);
        assert!(ledger.is_empty());
    }

    #[test]
    fn lookup_fault_never_resets_break_count() {
        let mut world = SimWorld::new();
        let actor = torpedo_in_stone(&mut world);
        let mut ledger = LifetimeLedger::default();
        for _ in 0..4 {
            ledger.record_break(actor.id);
        }
        world.faults_mut().lookups = true;
        assert_eq!(ledger.retain_live(&world), 0);
        assert_eq!(ledger.breaks(actor.id), 4);
    }
}
