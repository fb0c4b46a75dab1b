//! Nearest-hostile target resolution with a short per-actor memo.

use crate::sight::{can_see_target_through_blocks, SightRules};
use crate::spatial_cache::SpatialCache;
use engine_core::{DimensionId, EntityId};
use glam::Vec3;
use std::collections::{HashMap, HashSet};
use voxel::{EntitySnapshot, PlayerSnapshot, WorldAccess};

/// Something an aerial creature can attack. Resolved once when enumerated.
#[derive(Debug, Clone, PartialEq)]
pub enum Combatant {
    Player(PlayerSnapshot),
    Mob(EntitySnapshot),
}

impl Combatant {
    pub fn id(&self) -> EntityId {
        match self {
            Combatant::Player(p) => p.id,
            Combatant::Mob(m) => m.id,
        }
    }

    pub fn position(&self) -> Vec3 {
        match self {
            Combatant::Player(p) => p.position,
            Combatant::Mob(m) => m.position,
        }
    }

    pub fn dimension(&self) -> &DimensionId {
        match self {
            Combatant::Player(p) => &p.dimension,
            Combatant::Mob(m) => &m.dimension,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self, Combatant::Player(_))
    }
}

/// A resolved target relative to the actor that asked for it.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetInfo {
    pub target: Combatant,
    /// Target position minus actor position.
    pub displacement: Vec3,
    pub location: Vec3,
    pub is_player: bool,
}

impl TargetInfo {
    fn new(target: Combatant, actor_pos: Vec3) -> Self {
        let location = target.position();
        let is_player = target.is_player();
        Self {
            target,
            displacement: location - actor_pos,
            location,
            is_player,
        }
    }

    pub fn horizontal_distance(&self) -> f32 {
        Vec3::new(self.displacement.x, 0.0, self.displacement.z).length()
    }
}

#[derive(Debug, Clone)]
struct CachedTarget {
    computed_at: u64,
    result: Option<Combatant>,
}

/// Finds the nearest valid target for an actor, memoizing per actor id.
#[derive(Debug)]
pub struct TargetResolver {
    window: u64,
    /// Mob pre-filter radius relative to the requested range.
    mob_search_factor: f32,
    cache: HashMap<EntityId, CachedTarget>,
}

impl TargetResolver {
    pub fn new(window: u64, mob_search_factor: f32) -> Self {
        Self {
            window: window.max(1),
            mob_search_factor: mob_search_factor.max(1.0),
            cache: HashMap::new(),
        }
    }

    /// Nearest target within `max_distance` of `actor`, or `None`.
    ///
    /// Players are scanned before mobs and the first candidate at a given
    /// distance wins. With `sight` set, the first candidate found is always
    /// accepted and later, closer candidates only replace it when visible
    /// through the allowed amount of terrain.
    pub fn find_target(
        &mut self,
        world: &dyn WorldAccess,
        spatial: &mut SpatialCache,
        actor: &EntitySnapshot,
        max_distance: f32,
        tick: u64,
        sight: Option<SightRules<'_>>,
    ) -> Option<TargetInfo> {
        if let Some(cached) = self.cache.get(&actor.id) {
            if tick >= cached.computed_at && tick - cached.computed_at < self.window {
                match &cached.result {
                    None => return None,
                    Some(target) => {
                        if let Some(fresh) = revalidate(world, spatial, target, actor, max_distance) {
                            return Some(TargetInfo::new(fresh, actor.position));
                        }
                    }
                }
            }
        }

        let result = self.scan(world, spatial, actor, max_distance, tick, sight);
        self.cache.insert(
            actor.id,
            CachedTarget {
                computed_at: tick,
                result: result.clone(),
            },
        );
        result.map(|target| TargetInfo::new(target, actor.position))
    }

    fn scan(
        &self,
        world: &dyn WorldAccess,
        spatial: &mut SpatialCache,
        actor: &EntitySnapshot,
        max_distance: f32,
        tick: u64,
        sight: Option<SightRules<'_>>,
    ) -> Option<Combatant> {
        let max_sq = max_distance * max_distance;
        let mut best: Option<(Combatant, f32)> = None;

        let consider = |candidate: Combatant, best: &mut Option<(Combatant, f32)>| {
            let d_sq = candidate.position().distance_squared(actor.position);
            if d_sq > max_sq {
                return;
            }
            let replace = match (best.as_ref(), sight) {
                (None, _) => true,
                (Some((_, best_sq)), None) => d_sq < *best_sq,
                (Some((_, best_sq)), Some(rules)) => {
                    d_sq < *best_sq
                        && can_see_target_through_blocks(
                            world,
                            &actor.dimension,
                            actor.position,
                            candidate.position(),
                            rules,
                        )
                }
            };
            if replace {
                *best = Some((candidate, d_sq));
            }
        };

        for player in spatial.players(world, tick) {
            if player.id == actor.id
                || player.dimension != actor.dimension
                || !player.game_mode.is_targetable()
            {
                continue;
            }
            consider(Combatant::Player(player.clone()), &mut best);
        }

        let radius = max_distance * self.mob_search_factor;
        for mob in spatial.mobs(world, &actor.dimension, tick, Some((actor.position, radius))) {
            if mob.id == actor.id || !mob.valid {
                continue;
            }
            consider(Combatant::Mob(mob), &mut best);
        }

        best.map(|(target, _)| target)
    }

    /// Forget memos for actors not in `seen`.
    pub fn retain_actors(&mut self, seen: &HashSet<EntityId>) -> usize {
        let before = self.cache.len();
        self.cache.retain(|id, _| seen.contains(id));
        before - self.cache.len()
    }

    /// Drop memos whose actor or cached target no longer exists.
    pub fn verify_live(&mut self, world: &dyn WorldAccess) -> usize {
        let before = self.cache.len();
        self.cache.retain(|actor, cached| {
            let target_live = match &cached.result {
                Some(target) => still_live(world, target.id()),
                None => true,
            };
            still_live(world, *actor) && target_live
        });
        before - self.cache.len()
    }

    pub fn invalidate(&mut self, actor: EntityId) {
        self.cache.remove(&actor);
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// False only when the world says the entity is gone or invalid. Transient
/// lookup failures count as live.
fn still_live(world: &dyn WorldAccess, id: EntityId) -> bool {
    match world.entity(id) {
        Ok(entity) => entity.valid,
        Err(e) => !e.is_invalid_entity(),
    }
}

/// Re-read a cached target. Returns the up-to-date combatant if it is still
/// targetable, in the actor's dimension and within range.
fn revalidate(
    world: &dyn WorldAccess,
    spatial: &SpatialCache,
    target: &Combatant,
    actor: &EntitySnapshot,
    max_distance: f32,
) -> Option<Combatant> {
    let fresh = match target {
        Combatant::Player(p) => {
            let player = spatial.player(p.id)?;
            if !player.game_mode.is_targetable() {
                return None;
            }
            Combatant::Player(player.clone())
        }
        Combatant::Mob(m) => {
            let mob = world.entity(m.id).ok()?;
            if !mob.valid {
                return None;
            }
            Combatant::Mob(mob)
        }
    };
    if fresh.dimension() != &actor.dimension {
        return None;
    }
    if fresh.position().distance_squared(actor.position) > max_distance * max_distance {
        return None;
    }
    Some(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::GameMode;
    use glam::IVec3;
    use voxel::{BlockId, SimWorld};

    struct Fixture {
        world: SimWorld,
        spatial: SpatialCache,
        resolver: TargetResolver,
        dim: DimensionId,
    }

    fn fixture() -> Fixture {
        Fixture {
            world: SimWorld::new(),
            spatial: SpatialCache::new(10, 10, vec!["animal".to_string()]),
            resolver: TargetResolver::new(10, 2.0),
            dim: DimensionId::overworld(),
        }
    }

    fn actor_at(f: &mut Fixture, pos: Vec3) -> EntitySnapshot {
        let id = f.world.spawn_creature("phantom", "monster", &f.dim, pos);
        f.world.entity(id).unwrap()
    }

    #[test]
    fn creative_player_is_never_targeted() {
        let mut f = fixture();
        f.world.spawn_player("builder", &f.dim, Vec3::new(5.0, 0.0, 0.0), GameMode::Creative);
        let actor = actor_at(&mut f, Vec3::ZERO);
        let found = f.resolver.find_target(&f.world, &mut f.spatial, &actor, 32.0, 0, None);
        assert!(found.is_none());
    }

    #[test]
    fn nearest_player_then_mob() {
        let mut f = fixture();
        let near = f.world.spawn_player("near", &f.dim, Vec3::new(4.0, 0.0, 0.0), GameMode::Survival);
        f.world.spawn_player("far", &f.dim, Vec3::new(10.0, 0.0, 0.0), GameMode::Adventure);
        f.world.spawn_creature("cow", "animal", &f.dim, Vec3::new(6.0, 0.0, 0.0));
        let actor = actor_at(&mut f, Vec3::ZERO);

        let found = f
            .resolver
            .find_target(&f.world, &mut f.spatial, &actor, 32.0, 0, None)
            .unwrap();
        assert_eq!(found.target.id(), near);
        assert!(found.is_player);
        assert_eq!(found.displacement, Vec3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn mob_selected_when_closer_and_ties_keep_first() {
        let mut f = fixture();
        f.world.spawn_player("p", &f.dim, Vec3::new(5.0, 0.0, 0.0), GameMode::Survival);
        let cow = f.world.spawn_creature("cow", "animal", &f.dim, Vec3::new(0.0, 0.0, 3.0));
        let actor = actor_at(&mut f, Vec3::ZERO);
        let found = f
            .resolver
            .find_target(&f.world, &mut f.spatial, &actor, 32.0, 0, None)
            .unwrap();
        assert_eq!(found.target.id(), cow);
        assert!(!found.is_player);

        // Exact tie: the player is scanned first and stays.
        let mut f = fixture();
        let player = f.world.spawn_player("p", &f.dim, Vec3::new(5.0, 0.0, 0.0), GameMode::Survival);
        f.world.spawn_creature("cow", "animal", &f.dim, Vec3::new(0.0, 0.0, 5.0));
        let actor = actor_at(&mut f, Vec3::ZERO);
        let found = f
            .resolver
            .find_target(&f.world, &mut f.spatial, &actor, 32.0, 0, None)
            .unwrap();
        assert_eq!(found.target.id(), player);
    }

    #[test]
    fn out_of_range_and_other_dimension_ignored() {
        let mut f = fixture();
        f.world.spawn_player("far", &f.dim, Vec3::new(100.0, 0.0, 0.0), GameMode::Survival);
        f.world.spawn_player(
            "elsewhere",
            &DimensionId::new("the_nether"),
            Vec3::new(1.0, 0.0, 0.0),
            GameMode::Survival,
        );
        let actor = actor_at(&mut f, Vec3::ZERO);
        assert!(f
            .resolver
            .find_target(&f.world, &mut f.spatial, &actor, 32.0, 0, None)
            .is_none());
    }

    #[test]
    fn cached_result_is_idempotent_within_window() {
        let mut f = fixture();
        f.world.spawn_player("p", &f.dim, Vec3::new(8.0, 2.0, 0.0), GameMode::Survival);
        let actor = actor_at(&mut f, Vec3::ZERO);
        let a = f.resolver.find_target(&f.world, &mut f.spatial, &actor, 32.0, 0, None);
        let b = f.resolver.find_target(&f.world, &mut f.spatial, &actor, 32.0, 5, None);
        assert_eq!(a, b);
        assert_eq!(f.resolver.len(), 1);
    }

    #[test]
    fn cached_none_holds_until_window_expires() {
        let mut f = fixture();
        let actor = actor_at(&mut f, Vec3::ZERO);
        assert!(f.resolver.find_target(&f.world, &mut f.spatial, &actor, 32.0, 0, None).is_none());
        let cow = f.world.spawn_creature("cow", "animal", &f.dim, Vec3::new(3.0, 0.0, 0.0));
        f.spatial.invalidate();
        assert!(f.resolver.find_target(&f.world, &mut f.spatial, &actor, 32.0, 5, None).is_none());
        let found = f.resolver.find_target(&f.world, &mut f.spatial, &actor, 32.0, 10, None);
        assert_eq!(found.map(|t| t.target.id()), Some(cow));
    }

    #[test]
    fn cached_mob_rescanned_once_removed() {
        let mut f = fixture();
        let cow = f.world.spawn_creature("cow", "animal", &f.dim, Vec3::new(3.0, 0.0, 0.0));
        let pig = f.world.spawn_creature("pig", "animal", &f.dim, Vec3::new(9.0, 0.0, 0.0));
        let actor = actor_at(&mut f, Vec3::ZERO);
        let first = f.resolver.find_target(&f.world, &mut f.spatial, &actor, 32.0, 0, None);
        assert_eq!(first.map(|t| t.target.id()), Some(cow));

        f.world.despawn(cow);
        f.spatial.invalidate();
        let second = f.resolver.find_target(&f.world, &mut f.spatial, &actor, 32.0, 1, None);
        assert_eq!(second.map(|t| t.target.id()), Some(pig));
    }

    #[test]
    fn first_candidate_wins_when_closer_one_is_hidden() {
        let mut f = fixture();
        let ind: HashSet<BlockId> = HashSet::new();
        // Player scanned first, far but in the open.
        let player = f.world.spawn_player("p", &f.dim, Vec3::new(20.5, 10.5, 0.5), GameMode::Survival);
        // Closer cow behind a thick wall.
        f.world.spawn_creature("cow", "animal", &f.dim, Vec3::new(0.5, 10.5, 10.5));
        f.world
            .fill_box(&f.dim, IVec3::new(-2, 8, 3), IVec3::new(2, 12, 8), BlockId::Stone);
        let actor = actor_at(&mut f, Vec3::new(0.5, 10.5, 0.5));

        let rules = SightRules { tolerance: 3, indestructible: &ind };
        let found = f
            .resolver
            .find_target(&f.world, &mut f.spatial, &actor, 32.0, 0, Some(rules))
            .unwrap();
        assert_eq!(found.target.id(), player);
    }

    #[test]
    fn closer_visible_candidate_replaces_first() {
        let mut f = fixture();
        let ind: HashSet<BlockId> = HashSet::new();
        f.world.spawn_player("p", &f.dim, Vec3::new(20.5, 10.5, 0.5), GameMode::Survival);
        // Thin screen: two blocks on the line, within tolerance.
        let cow = f.world.spawn_creature("cow", "animal", &f.dim, Vec3::new(0.5, 10.5, 10.5));
        f.world
            .fill_box(&f.dim, IVec3::new(0, 10, 4), IVec3::new(0, 10, 5), BlockId::Stone);
        let actor = actor_at(&mut f, Vec3::new(0.5, 10.5, 0.5));

        let rules = SightRules { tolerance: 3, indestructible: &ind };
        let found = f
            .resolver
            .find_target(&f.world, &mut f.spatial, &actor, 32.0, 0, Some(rules))
            .unwrap();
        assert_eq!(found.target.id(), cow);
        assert!(!found.is_player);
    }

    #[test]
    fn transient_lookup_failure_keeps_memo() {
        let mut f = fixture();
        let pig = f.world.spawn_creature("pig", "animal", &f.dim, Vec3::new(3.0, 0.0, 0.0));
        let actor = actor_at(&mut f, Vec3::ZERO);
        f.resolver.find_target(&f.world, &mut f.spatial, &actor, 8.0, 0, None);
        assert_eq!(f.resolver.len(), 1);

        f.world.faults_mut().lookups = true;
        assert_eq!(f.resolver.verify_live(&f.world), 0);
        assert_eq!(f.resolver.len(), 1);

        f.world.faults_mut().lookups = false;
        f.world.invalidate(pig);
        assert_eq!(f.resolver.verify_live(&f.world), 1);
    }

    #[test]
    fn pruning_by_seen_set() {
        let mut f = fixture();
        let a = actor_at(&mut f, Vec3::ZERO);
        let b = actor_at(&mut f, Vec3::ONE);
        f.resolver.find_target(&f.world, &mut f.spatial, &a, 8.0, 0, None);
        f.resolver.find_target(&f.world, &mut f.spatial, &b, 8.0, 0, None);
        let seen: HashSet<EntityId> = [a.id].into_iter().collect();
        assert_eq!(f.resolver.retain_actors(&seen), 1);
        f.world.despawn(a.id);
        assert_eq!(f.resolver.verify_live(&f.world), 1);
        assert!(f.resolver.is_empty());
    }
}
