//! Self-destruct: explosion effects, a snow scar on the ground, removal.

use crate::outcome::Outcome;
use glam::IVec3;
use voxel::{BlockId, EntitySnapshot, WorldAccess};

pub const EXPLOSION_SOUND: &str = "entity.generic.explode";
pub const EXPLOSION_PARTICLE: &str = "explosion_emitter";
pub const SMOKE_PARTICLE: &str = "large_smoke";

/// Vertical reach of the scar scan around the entity.
const SCAR_REACH: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetonationReport {
    /// Columns that received snow.
    pub scarred: u32,
    pub removal: Outcome,
}

/// Run the whole sequence. Every step is best effort; removal is always
/// attempted.
pub fn self_destruct(world: &mut dyn WorldAccess, actor: &EntitySnapshot, scar_radius: i32) -> DetonationReport {
    let dim = &actor.dimension;
    let at = actor.position;
    let _ = world.spawn_particles(dim, at, EXPLOSION_PARTICLE, 1, 0.0);
    let _ = world.spawn_particles(dim, at, SMOKE_PARTICLE, 24, 2.0);
    let _ = world.play_sound(dim, at, EXPLOSION_SOUND, 4.0, 1.0);

    let scarred = scar_ground(world, actor, scar_radius);
    let removal = Outcome::from(world.remove_entity(actor.id));
    log::debug!("{} detonated, {} columns scarred", actor.id, scarred);
    DetonationReport { scarred, removal }
}

/// Lay snow on the topmost solid block of each column in a disc around the
/// entity, within [`SCAR_REACH`] blocks of it vertically.
fn scar_ground(world: &mut dyn WorldAccess, actor: &EntitySnapshot, radius: i32) -> u32 {
    let center = actor.block_pos();
    let r = radius.max(0);
    let mut scarred = 0;
    for dz in -r..=r {
        for dx in -r..=r {
            if dx * dx + dz * dz > r * r {
                continue;
            }
            if scar_column(world, actor, center.x + dx, center.z + dz, center.y) {
                scarred += 1;
            }
        }
    }
    scarred
}

fn scar_column(world: &mut dyn WorldAccess, actor: &EntitySnapshot, x: i32, z: i32, cy: i32) -> bool {
    let dim = &actor.dimension;
    for y in (cy - SCAR_REACH..=cy + SCAR_REACH).rev() {
        let pos = IVec3::new(x, y, z);
        let Ok(block) = world.block(dim, pos) else {
            continue;
        };
        if block.is_air() || block.is_liquid() || block.is_snow_layer() {
            continue;
        }
        if block.is_foliage() {
            return world.set_block(dim, pos, BlockId::SnowLayer).is_ok();
        }
        let above = pos + IVec3::Y;
        return match world.block(dim, above) {
            Ok(b) if b.is_air() => world.set_block(dim, above, BlockId::SnowLayer).is_ok(),
            _ => false,
        };
    }
    false
}
