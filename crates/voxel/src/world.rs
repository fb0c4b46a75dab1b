//! The world collaborator interface consumed by the aerial AI.

use crate::BlockId;
use engine_core::{DimensionId, EntityId, GameMode, WorldError};
use glam::{IVec3, Vec3};

/// Point-in-time view of a non-player entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    pub id: EntityId,
    /// Type identifier, e.g. `phantom` or `sky_torpedo`.
    pub type_id: String,
    /// Coarse family used for batched mob queries, e.g. `monster`, `animal`.
    pub family: String,
    pub dimension: DimensionId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub valid: bool,
}

impl EntitySnapshot {
    pub fn block_pos(&self) -> IVec3 {
        block_pos(self.position)
    }
}

/// Point-in-time view of a player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub id: EntityId,
    pub name: String,
    pub dimension: DimensionId,
    pub position: Vec3,
    pub game_mode: GameMode,
}

/// Block coordinate containing a world position.
pub fn block_pos(position: Vec3) -> IVec3 {
    position.floor().as_ivec3()
}

/// Center of a block in world space.
pub fn block_center(pos: IVec3) -> Vec3 {
    pos.as_vec3() + Vec3::splat(0.5)
}

/// Everything the AI needs from its host. All calls are synchronous; errors
/// are transient or describe an entity that vanished, never fatal.
pub trait WorldAccess {
    /// Partitions currently loaded, in host order.
    fn dimensions(&self) -> Vec<DimensionId>;

    /// Every online player across all partitions.
    fn players(&self) -> Result<Vec<PlayerSnapshot>, WorldError>;

    /// Entities of one type identifier in a partition.
    fn entities_of_type(
        &self,
        dimension: &DimensionId,
        type_id: &str,
    ) -> Result<Vec<EntitySnapshot>, WorldError>;

    /// Batched query for mobs whose family is one of `families`.
    fn mobs(
        &self,
        dimension: &DimensionId,
        families: &[String],
    ) -> Result<Vec<EntitySnapshot>, WorldError>;

    /// Fresh snapshot of one entity (player or not).
    fn entity(&self, id: EntityId) -> Result<EntitySnapshot, WorldError>;

    fn block(&self, dimension: &DimensionId, pos: IVec3) -> Result<BlockId, WorldError>;

    fn set_block(
        &mut self,
        dimension: &DimensionId,
        pos: IVec3,
        block: BlockId,
    ) -> Result<(), WorldError>;

    /// Add `impulse` to the entity's velocity.
    fn apply_impulse(&mut self, id: EntityId, impulse: Vec3) -> Result<(), WorldError>;

    fn play_sound(
        &mut self,
        dimension: &DimensionId,
        at: Vec3,
        sound: &str,
        volume: f32,
        pitch: f32,
    ) -> Result<(), WorldError>;

    fn spawn_particles(
        &mut self,
        dimension: &DimensionId,
        at: Vec3,
        particle: &str,
        count: u32,
        spread: f32,
    ) -> Result<(), WorldError>;

    fn remove_entity(&mut self, id: EntityId) -> Result<(), WorldError>;
}
