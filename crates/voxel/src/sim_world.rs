//! In-memory reference world: hecs entities plus chunked voxel terrain.

use crate::{block_pos, BlockId, EntitySnapshot, PlayerSnapshot, VoxelChunk, WorldAccess};
use engine_core::{DimensionId, EntityId, GameMode, Velocity, WorldError};
use glam::{IVec3, Vec3};
use hecs::{Entity, World};
use std::collections::HashMap;

/// Where an entity is.
#[derive(Debug, Clone)]
pub struct Body {
    pub dimension: DimensionId,
    pub position: Vec3,
}

/// Non-player creature data.
#[derive(Debug, Clone)]
pub struct Creature {
    pub type_id: String,
    pub family: String,
    pub valid: bool,
}

/// Player data.
#[derive(Debug, Clone)]
pub struct PlayerInfo {
    pub name: String,
    pub game_mode: GameMode,
}

/// Switches that make the next calls fail, for exercising degradation paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultInjection {
    /// Player/entity enumeration returns `Unavailable`.
    pub queries: bool,
    /// Block reads return `Unavailable`.
    pub blocks: bool,
    /// Block writes, impulses, sounds and particles return `Rejected`.
    pub mutations: bool,
    /// Single-entity lookups return `Unavailable`.
    pub lookups: bool,
    /// Entity removal returns `Rejected`.
    pub removals: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoundEvent {
    pub dimension: DimensionId,
    pub position: Vec3,
    pub sound: String,
    pub volume: f32,
    pub pitch: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticleEvent {
    pub dimension: DimensionId,
    pub position: Vec3,
    pub particle: String,
    pub count: u32,
}

/// Record of side effects, for assertions and the demo summary.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    pub sounds: Vec<SoundEvent>,
    pub particles: Vec<ParticleEvent>,
    pub impulses: Vec<(EntityId, Vec3)>,
    pub removed: Vec<EntityId>,
    pub blocks_changed: usize,
}

impl Journal {
    pub fn impulses_for(&self, id: EntityId) -> impl Iterator<Item = Vec3> + '_ {
        self.impulses.iter().filter(move |(e, _)| *e == id).map(|(_, v)| *v)
    }

    pub fn sounds_named<'a>(&'a self, sound: &'a str) -> impl Iterator<Item = &'a SoundEvent> {
        self.sounds.iter().filter(move |s| s.sound == sound)
    }
}

/// A complete world held in memory.
pub struct SimWorld {
    entities: World,
    dimensions: Vec<DimensionId>,
    terrain: HashMap<DimensionId, HashMap<IVec3, VoxelChunk>>,
    faults: FaultInjection,
    journal: Journal,
    /// Fraction of velocity kept per [`SimWorld::step`].
    pub drag: f32,
    /// Downward acceleration per step, in blocks/tick².
    pub gravity: f32,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

fn to_id(entity: Entity) -> EntityId {
    EntityId(entity.to_bits().get())
}

fn to_entity(id: EntityId) -> Option<Entity> {
    Entity::from_bits(id.0)
}

impl SimWorld {
    pub fn new() -> Self {
        Self {
            entities: World::new(),
            dimensions: vec![DimensionId::overworld()],
            terrain: HashMap::new(),
            faults: FaultInjection::default(),
            journal: Journal::default(),
            drag: 0.91,
            gravity: 0.0,
        }
    }

    pub fn add_dimension(&mut self, dimension: DimensionId) {
        if !self.dimensions.contains(&dimension) {
            self.dimensions.push(dimension);
        }
    }

    pub fn spawn_player(
        &mut self,
        name: &str,
        dimension: &DimensionId,
        position: Vec3,
        game_mode: GameMode,
    ) -> EntityId {
        self.add_dimension(dimension.clone());
        let entity = self.entities.spawn((
            Body {
                dimension: dimension.clone(),
                position,
            },
            Velocity::default(),
            PlayerInfo {
                name: name.to_string(),
                game_mode,
            },
        ));
        to_id(entity)
    }

    pub fn spawn_creature(
        &mut self,
        type_id: &str,
        family: &str,
        dimension: &DimensionId,
        position: Vec3,
    ) -> EntityId {
        self.add_dimension(dimension.clone());
        let entity = self.entities.spawn((
            Body {
                dimension: dimension.clone(),
                position,
            },
            Velocity::default(),
            Creature {
                type_id: type_id.to_string(),
                family: family.to_string(),
                valid: true,
            },
        ));
        to_id(entity)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        to_entity(id).is_some_and(|e| self.entities.contains(e))
    }

    pub fn position(&self, id: EntityId) -> Option<Vec3> {
        let entity = to_entity(id)?;
        self.entities.get::<&Body>(entity).ok().map(|b| b.position)
    }

    pub fn velocity(&self, id: EntityId) -> Option<Vec3> {
        let entity = to_entity(id)?;
        self.entities.get::<&Velocity>(entity).ok().map(|v| v.linear)
    }

    pub fn set_velocity(&mut self, id: EntityId, linear: Vec3) {
        if let Some(entity) = to_entity(id) {
            if let Ok(mut velocity) = self.entities.get::<&mut Velocity>(entity) {
                velocity.linear = linear;
            }
        }
    }

    /// Mark a creature invalid without removing it (host-side despawn race).
    pub fn invalidate(&mut self, id: EntityId) {
        if let Some(entity) = to_entity(id) {
            if let Ok(mut creature) = self.entities.get::<&mut Creature>(entity) {
                creature.valid = false;
            }
        }
    }

    /// Despawn directly, bypassing the journal.
    pub fn despawn(&mut self, id: EntityId) {
        if let Some(entity) = to_entity(id) {
            self.entities.despawn(entity).ok();
        }
    }

    pub fn faults_mut(&mut self) -> &mut FaultInjection {
        &mut self.faults
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn clear_journal(&mut self) {
        self.journal = Journal::default();
    }

    /// Read a block without fault injection.
    pub fn block_at(&self, dimension: &DimensionId, pos: IVec3) -> BlockId {
        self.terrain
            .get(dimension)
            .and_then(|chunks| chunks.get(&VoxelChunk::key_for(pos)))
            .map(|chunk| chunk.get_local(VoxelChunk::local_for(pos)))
            .unwrap_or(BlockId::Air)
    }

    /// Write a block without fault injection or journaling.
    pub fn put_block(&mut self, dimension: &DimensionId, pos: IVec3, block: BlockId) {
        let chunks = self.terrain.entry(dimension.clone()).or_default();
        let key = VoxelChunk::key_for(pos);
        if block.is_air() && !chunks.contains_key(&key) {
            return;
        }
        let chunk = chunks
            .entry(key)
            .or_default();
        chunk.set_local(VoxelChunk::local_for(pos), block);
        if chunk.is_empty() {
            chunks.remove(&key);
        }
    }

    /// Fill an inclusive box of blocks.
    pub fn fill_box(&mut self, dimension: &DimensionId, min: IVec3, max: IVec3, block: BlockId) {
        for z in min.z..=max.z {
            for y in min.y..=max.y {
                for x in min.x..=max.x {
                    self.put_block(dimension, IVec3::new(x, y, z), block);
                }
            }
        }
    }

    /// Integrate velocities into positions with gravity and drag. Entities do
    /// not pass through solid blocks vertically.
    pub fn step(&mut self) {
        let gravity = self.gravity;
        let drag = self.drag;
        let mut moved: Vec<(Entity, DimensionId, Vec3, Vec3)> = Vec::new();
        for (entity, (body, velocity)) in self
            .entities
            .query_mut::<(&Body, &mut Velocity)>()
            .without::<&PlayerInfo>()
        {
            velocity.linear.y -= gravity;
            moved.push((entity, body.dimension.clone(), body.position, velocity.linear));
        }

        for (entity, dimension, position, linear) in moved {
            let mut next = position + linear;
            if self.block_at(&dimension, block_pos(next)).is_solid() {
                // Blocked: keep the horizontal move only if that cell is free.
                let horizontal = Vec3::new(next.x, position.y, next.z);
                next = if self.block_at(&dimension, block_pos(horizontal)).is_solid() {
                    position
                } else {
                    horizontal
                };
                if let Ok(mut velocity) = self.entities.get::<&mut Velocity>(entity) {
                    velocity.linear.y = 0.0;
                }
            }
            if let Ok(mut body) = self.entities.get::<&mut Body>(entity) {
                body.position = next;
            }
            if let Ok(mut velocity) = self.entities.get::<&mut Velocity>(entity) {
                velocity.damp(drag);
            }
        }
    }

    fn snapshot(&self, entity: Entity) -> Result<EntitySnapshot, WorldError> {
        let id = to_id(entity);
        let body = self
            .entities
            .get::<&Body>(entity)
            .map_err(|_| WorldError::NoSuchEntity(id))?;
        let velocity = self
            .entities
            .get::<&Velocity>(entity)
            .map(|v| v.linear)
            .unwrap_or(Vec3::ZERO);
        let (type_id, family, valid) = match self.entities.get::<&Creature>(entity) {
            Ok(c) => (c.type_id.clone(), c.family.clone(), c.valid),
            Err(_) => ("player".to_string(), "player".to_string(), true),
        };
        Ok(EntitySnapshot {
            id,
            type_id,
            family,
            dimension: body.dimension.clone(),
            position: body.position,
            velocity,
            valid,
        })
    }

    fn creatures_where<F>(&self, dimension: &DimensionId, keep: F) -> Vec<EntitySnapshot>
    where
        F: Fn(&Creature) -> bool,
    {
        let mut found: Vec<EntitySnapshot> = self
            .entities
            .query::<(&Body, &Velocity, &Creature)>()
            .iter()
            .filter(|(_, (body, _, creature))| &body.dimension == dimension && keep(creature))
            .map(|(entity, (body, velocity, creature))| EntitySnapshot {
                id: to_id(entity),
                type_id: creature.type_id.clone(),
                family: creature.family.clone(),
                dimension: body.dimension.clone(),
                position: body.position,
                velocity: velocity.linear,
                valid: creature.valid,
            })
            .collect();
        // Spawn order, so enumeration is deterministic.
        found.sort_by_key(|e| e.id);
        found
    }

    fn check_known(&self, dimension: &DimensionId) -> Result<(), WorldError> {
        if self.dimensions.contains(dimension) {
            Ok(())
        } else {
            Err(WorldError::UnknownDimension(dimension.clone()))
        }
    }

    fn check_mutation(&self, what: &str) -> Result<(), WorldError> {
        if self.faults.mutations {
            Err(WorldError::Rejected(what.to_string()))
        } else {
            Ok(())
        }
    }
}

impl WorldAccess for SimWorld {
    fn dimensions(&self) -> Vec<DimensionId> {
        self.dimensions.clone()
    }

    fn players(&self) -> Result<Vec<PlayerSnapshot>, WorldError> {
        if self.faults.queries {
            return Err(WorldError::Unavailable("player list".into()));
        }
        let mut players: Vec<PlayerSnapshot> = self
            .entities
            .query::<(&Body, &PlayerInfo)>()
            .iter()
            .map(|(entity, (body, info))| PlayerSnapshot {
                id: to_id(entity),
                name: info.name.clone(),
                dimension: body.dimension.clone(),
                position: body.position,
                game_mode: info.game_mode,
            })
            .collect();
        players.sort_by_key(|p| p.id);
        Ok(players)
    }

    fn entities_of_type(
        &self,
        dimension: &DimensionId,
        type_id: &str,
    ) -> Result<Vec<EntitySnapshot>, WorldError> {
        if self.faults.queries {
            return Err(WorldError::Unavailable(format!("entities of type {type_id}")));
        }
        self.check_known(dimension)?;
        Ok(self.creatures_where(dimension, |c| c.type_id == type_id))
    }

    fn mobs(
        &self,
        dimension: &DimensionId,
        families: &[String],
    ) -> Result<Vec<EntitySnapshot>, WorldError> {
        if self.faults.queries {
            return Err(WorldError::Unavailable("mob query".into()));
        }
        self.check_known(dimension)?;
        Ok(self.creatures_where(dimension, |c| families.iter().any(|f| *f == c.family)))
    }

    fn entity(&self, id: EntityId) -> Result<EntitySnapshot, WorldError> {
        if self.faults.lookups {
            return Err(WorldError::Unavailable(format!("entity {id}")));
        }
        let entity = to_entity(id).ok_or(WorldError::NoSuchEntity(id))?;
        if !self.entities.contains(entity) {
            return Err(WorldError::NoSuchEntity(id));
        }
        self.snapshot(entity)
    }

    fn block(&self, dimension: &DimensionId, pos: IVec3) -> Result<BlockId, WorldError> {
        if self.faults.blocks {
            return Err(WorldError::Unavailable(format!("block at {pos}")));
        }
        self.check_known(dimension)?;
        Ok(self.block_at(dimension, pos))
    }

    fn set_block(
        &mut self,
        dimension: &DimensionId,
        pos: IVec3,
        block: BlockId,
    ) -> Result<(), WorldError> {
        self.check_mutation("set_block")?;
        self.check_known(dimension)?;
        self.put_block(dimension, pos, block);
        self.journal.blocks_changed += 1;
        Ok(())
    }

    fn apply_impulse(&mut self, id: EntityId, impulse: Vec3) -> Result<(), WorldError> {
        self.check_mutation("apply_impulse")?;
        let entity = to_entity(id).ok_or(WorldError::NoSuchEntity(id))?;
        if let Ok(creature) = self.entities.get::<&Creature>(entity) {
            if !creature.valid {
                return Err(WorldError::InvalidEntity(id));
            }
        }
        let mut velocity = self
            .entities
            .get::<&mut Velocity>(entity)
            .map_err(|_| WorldError::NoSuchEntity(id))?;
        velocity.apply_impulse(impulse);
        self.journal.impulses.push((id, impulse));
        Ok(())
    }

    fn play_sound(
        &mut self,
        dimension: &DimensionId,
        at: Vec3,
        sound: &str,
        volume: f32,
        pitch: f32,
    ) -> Result<(), WorldError> {
        self.check_mutation("play_sound")?;
        self.journal.sounds.push(SoundEvent {
            dimension: dimension.clone(),
            position: at,
            sound: sound.to_string(),
            volume,
            pitch,
        });
        Ok(())
    }

    fn spawn_particles(
        &mut self,
        dimension: &DimensionId,
        at: Vec3,
        particle: &str,
        count: u32,
        _spread: f32,
    ) -> Result<(), WorldError> {
        self.check_mutation("spawn_particles")?;
        self.journal.particles.push(ParticleEvent {
            dimension: dimension.clone(),
            position: at,
            particle: particle.to_string(),
            count,
        });
        Ok(())
    }

    fn remove_entity(&mut self, id: EntityId) -> Result<(), WorldError> {
        if self.faults.removals {
            return Err(WorldError::Rejected(format!("remove {id}")));
        }
        let entity = to_entity(id).ok_or(WorldError::NoSuchEntity(id))?;
        self.entities
            .despawn(entity)
            .map_err(|_| WorldError::NoSuchEntity(id))?;
        self.journal.removed.push(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ids_round_trip() {
        let mut world = SimWorld::new();
        let dim = DimensionId::overworld();
        let id = world.spawn_creature("phantom", "monster", &dim, Vec3::new(1.0, 2.0, 3.0));
        let snap = world.entity(id).unwrap();
        assert_eq!(snap.type_id, "phantom");
        assert_eq!(snap.position, Vec3::new(1.0, 2.0, 3.0));
        world.remove_entity(id).unwrap();
        assert!(matches!(world.entity(id), Err(WorldError::NoSuchEntity(_))));
        assert_eq!(world.journal().removed, vec![id]);
    }

    #[test]
    fn impulses_accumulate_and_respect_validity() {
        let mut world = SimWorld::new();
        let dim = DimensionId::overworld();
        let id = world.spawn_creature("phantom", "monster", &dim, Vec3::ZERO);
        world.apply_impulse(id, Vec3::X).unwrap();
        world.apply_impulse(id, Vec3::Y).unwrap();
        assert_eq!(world.velocity(id), Some(Vec3::new(1.0, 1.0, 0.0)));

        world.invalidate(id);
        assert_eq!(world.apply_impulse(id, Vec3::X), Err(WorldError::InvalidEntity(id)));
    }

    #[test]
    fn block_writes_and_fault_injection() {
        let mut world = SimWorld::new();
        let dim = DimensionId::overworld();
        let pos = IVec3::new(-3, 70, 12);
        world.set_block(&dim, pos, BlockId::Stone).unwrap();
        assert_eq!(world.block(&dim, pos), Ok(BlockId::Stone));

        world.faults_mut().blocks = true;
        assert!(matches!(world.block(&dim, pos), Err(WorldError::Unavailable(_))));
        world.faults_mut().mutations = true;
        assert!(world.set_block(&dim, pos, BlockId::Air).is_err());
    }

    #[test]
    fn lookup_and_removal_faults_leave_entity_alone() {
        let mut world = SimWorld::new();
        let id = world.spawn_creature("phantom", "monster", &DimensionId::overworld(), Vec3::ZERO);
        world.faults_mut().lookups = true;
        world.faults_mut().removals = true;
        assert!(matches!(world.entity(id), Err(WorldError::Unavailable(_))));
        assert!(matches!(world.remove_entity(id), Err(WorldError::Rejected(_))));
        assert!(world.contains(id));
        assert!(world.journal().removed.is_empty());
    }

    #[test]
    fn queries_filter_by_dimension_and_family() {
        let mut world = SimWorld::new();
        let over = DimensionId::overworld();
        let nether = DimensionId::new("minecraft:the_nether");
        world.spawn_creature("zombie", "monster", &over, Vec3::ZERO);
        world.spawn_creature("cow", "animal", &over, Vec3::ZERO);
        world.spawn_creature("zombie", "monster", &nether, Vec3::ZERO);

        let monsters = world.mobs(&over, &["monster".to_string()]).unwrap();
        assert_eq!(monsters.len(), 1);
        assert_eq!(world.entities_of_type(&nether, "zombie").unwrap().len(), 1);
        assert!(world.entities_of_type(&DimensionId::new("the_end"), "zombie").is_err());
    }

    #[test]
    fn step_stops_at_solid_ground() {
        let mut world = SimWorld::new();
        let dim = DimensionId::overworld();
        world.fill_box(&dim, IVec3::new(-2, 0, -2), IVec3::new(2, 9, 2), BlockId::Stone);
        let id = world.spawn_creature("phantom", "monster", &dim, Vec3::new(0.5, 10.5, 0.5));
        world.set_velocity(id, Vec3::new(0.0, -3.0, 0.0));
        world.step();
        assert!(world.position(id).unwrap().y >= 10.0);
    }
}
