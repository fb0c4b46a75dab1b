//! Line-of-sight through a tolerated amount of terrain.

use engine_core::DimensionId;
use glam::Vec3;
use std::collections::HashSet;
use voxel::{block_pos, BlockId, WorldAccess};

/// How much terrain a torpedo may look through.
#[derive(Debug, Clone, Copy)]
pub struct SightRules<'a> {
    /// Non-air blocks allowed on the line.
    pub tolerance: u32,
    /// Any of these on the line blocks sight outright.
    pub indestructible: &'a HashSet<BlockId>,
}

/// Walk the segment `from → to` in unit steps and count non-air blocks.
///
/// Returns false as soon as an indestructible block is hit or the count
/// exceeds the tolerance. Unreadable blocks count as air. Each block cell is
/// counted once even if several samples land in it.
pub fn can_see_target_through_blocks(
    world: &dyn WorldAccess,
    dimension: &DimensionId,
    from: Vec3,
    to: Vec3,
    rules: SightRules<'_>,
) -> bool {
    let delta = to - from;
    let length = delta.length();
    if length < f32::EPSILON {
        return true;
    }
    let dir = delta / length;
    let steps = length.floor() as u32;
    let start_cell = block_pos(from);
    let end_cell = block_pos(to);

    let mut solid = 0u32;
    let mut last_cell = None;
    for i in 1..=steps {
        let cell = block_pos(from + dir * i as f32);
        // The endpoints are the actor and the target themselves.
        if cell == start_cell || cell == end_cell || last_cell == Some(cell) {
            continue;
        }
        last_cell = Some(cell);
        let block = match world.block(dimension, cell) {
            Ok(block) => block,
            Err(_) => continue,
        };
        if block.is_air() {
            continue;
        }
        if rules.indestructible.contains(&block) {
            return false;
        }
        solid += 1;
        if solid > rules.tolerance {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;
    use voxel::SimWorld;

    fn setup() -> (SimWorld, DimensionId, HashSet<BlockId>) {
        let world = SimWorld::new();
        let indestructible: HashSet<BlockId> = [BlockId::Bedrock].into_iter().collect();
        (world, DimensionId::overworld(), indestructible)
    }

    fn wall(world: &mut SimWorld, dim: &DimensionId, x: i32, block: BlockId) {
        world.put_block(dim, IVec3::new(x, 10, 0), block);
    }

    #[test]
    fn clear_line_is_visible() {
        let (world, dim, ind) = setup();
        let rules = SightRules { tolerance: 3, indestructible: &ind };
        assert!(can_see_target_through_blocks(
            &world,
            &dim,
            Vec3::new(0.5, 10.5, 0.5),
            Vec3::new(20.5, 10.5, 0.5),
            rules
        ));
    }

    #[test]
    fn tolerance_counts_solid_blocks() {
        let (mut world, dim, ind) = setup();
        for x in 5..8 {
            wall(&mut world, &dim, x, BlockId::Stone);
        }
        let rules = SightRules { tolerance: 3, indestructible: &ind };
        let from = Vec3::new(0.5, 10.5, 0.5);
        let to = Vec3::new(20.5, 10.5, 0.5);
        assert!(can_see_target_through_blocks(&world, &dim, from, to, rules));

        wall(&mut world, &dim, 8, BlockId::Dirt);
        assert!(!can_see_target_through_blocks(&world, &dim, from, to, rules));
    }

    #[test]
    fn indestructible_blocks_sight_immediately() {
        let (mut world, dim, ind) = setup();
        wall(&mut world, &dim, 5, BlockId::Bedrock);
        let rules = SightRules { tolerance: 10, indestructible: &ind };
        assert!(!can_see_target_through_blocks(
            &world,
            &dim,
            Vec3::new(0.5, 10.5, 0.5),
            Vec3::new(20.5, 10.5, 0.5),
            rules
        ));
    }

    #[test]
    fn unreadable_blocks_count_as_air() {
        let (mut world, dim, ind) = setup();
        for x in 3..10 {
            wall(&mut world, &dim, x, BlockId::Stone);
        }
        world.faults_mut().blocks = true;
        let rules = SightRules { tolerance: 0, indestructible: &ind };
        assert!(can_see_target_through_blocks(
            &world,
            &dim,
            Vec3::new(0.5, 10.5, 0.5),
            Vec3::new(20.5, 10.5, 0.5),
            rules
        ));
    }
}
