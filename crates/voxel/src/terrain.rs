//! Layered noise terrain for the reference world.
//!
//! Height at (x, z) comes from two octaves of Perlin noise. Columns are filled
//! bottom-up with bedrock, stone, dirt and a biome surface block; a sprinkle of
//! short grass and ferns sits on grassy columns so snow scarring has foliage to
//! replace.

use crate::{BlockId, SimWorld};
use engine_core::DimensionId;
use glam::IVec3;
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

/// Bottom layers of every column.
const BEDROCK_LAYERS: i32 = 2;
/// Dirt between stone and the surface block.
const DIRT_LAYERS: i32 = 3;

/// Terrain generation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub seed: u64,
    /// Half extent of the generated square, in blocks.
    pub half_extent: i32,
    /// World Y of the lowest block (bedrock).
    pub floor_y: i32,
    /// Average surface height.
    pub base_height: f32,
    /// Peak deviation from `base_height`.
    pub height_scale: f32,
    pub frequency: f64,
    /// Surfaces above this Y are snow.
    pub snow_line: i32,
    /// Fraction of grass columns that get a plant on top.
    pub foliage_density: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            half_extent: 48,
            floor_y: 0,
            base_height: 64.0,
            height_scale: 10.0,
            frequency: 0.03,
            snow_line: 72,
            foliage_density: 0.15,
        }
    }
}

/// Deterministic noise seed from world seed.
#[inline]
fn noise_seed(seed: u64, offset: u64) -> u32 {
    ((seed.wrapping_add(offset))
        .wrapping_mul(0x9e3779b97f4a7c15_u64)
        .wrapping_add(offset.wrapping_mul(0x6c078965_u64))
        >> 32) as u32
}

/// Samples surface height and foliage placement.
pub struct TerrainGenerator {
    config: TerrainConfig,
    height_noise: Perlin,
    detail_noise: Perlin,
    foliage_noise: Perlin,
}

impl TerrainGenerator {
    pub fn new(config: TerrainConfig) -> Self {
        Self {
            height_noise: Perlin::new(noise_seed(config.seed, 1)),
            detail_noise: Perlin::new(noise_seed(config.seed, 2)),
            foliage_noise: Perlin::new(noise_seed(config.seed, 3)),
            config,
        }
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Y of the topmost solid block in column (x, z).
    pub fn surface_y(&self, x: i32, z: i32) -> i32 {
        let f = self.config.frequency;
        let (wx, wz) = (x as f64, z as f64);
        let broad = self.height_noise.get([wx * f, wz * f]);
        let detail = self.detail_noise.get([wx * f * 4.0, wz * f * 4.0]) * 0.25;
        let h = self.config.base_height as f64 + (broad + detail) * self.config.height_scale as f64;
        (h.floor() as i32).max(self.config.floor_y + BEDROCK_LAYERS)
    }

    fn surface_block(&self, top: i32) -> BlockId {
        if top >= self.config.snow_line {
            BlockId::SnowBlock
        } else {
            BlockId::GrassBlock
        }
    }

    fn plant_at(&self, x: i32, z: i32) -> Option<BlockId> {
        let n = self.foliage_noise.get([x as f64 * 0.9, z as f64 * 0.9]);
        // Perlin output is roughly symmetric in [-1, 1].
        let threshold = 1.0 - 2.0 * self.config.foliage_density;
        if n > threshold {
            Some(if (x + z).rem_euclid(3) == 0 { BlockId::Fern } else { BlockId::ShortGrass })
        } else {
            None
        }
    }

    /// Fill the configured square of `dimension` with terrain.
    pub fn generate(&self, world: &mut SimWorld, dimension: &DimensionId) {
        world.add_dimension(dimension.clone());
        let half = self.config.half_extent;
        let floor = self.config.floor_y;
        for z in -half..half {
            for x in -half..half {
                let top = self.surface_y(x, z);
                let stone_top = top - DIRT_LAYERS - 1;
                for y in floor..=top {
                    let block = if y < floor + BEDROCK_LAYERS {
                        BlockId::Bedrock
                    } else if y == top {
                        self.surface_block(top)
                    } else if y > stone_top {
                        BlockId::Dirt
                    } else {
                        BlockId::Stone
                    };
                    world.put_block(dimension, IVec3::new(x, y, z), block);
                }
                if self.surface_block(top) == BlockId::GrassBlock {
                    if let Some(plant) = self.plant_at(x, z) {
                        world.put_block(dimension, IVec3::new(x, top + 1, z), plant);
                    }
                }
            }
        }
        log::info!(
            "Generated terrain for {} ({}x{} columns, seed {})",
            dimension,
            half * 2,
            half * 2,
            self.config.seed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Same seed must produce identical heights (replayable demo runs).
    #[test]
    fn terrain_deterministic_same_seed() {
        let a = TerrainGenerator::new(TerrainConfig { seed: 98765, ..Default::default() });
        let b = TerrainGenerator::new(TerrainConfig { seed: 98765, ..Default::default() });
        for x in -10..10 {
            assert_eq!(a.surface_y(x, x * 3), b.surface_y(x, x * 3));
        }
    }

    #[test]
    fn columns_are_layered() {
        let config = TerrainConfig { half_extent: 4, ..Default::default() };
        let generator = TerrainGenerator::new(config);
        let mut world = SimWorld::new();
        let dim = DimensionId::overworld();
        generator.generate(&mut world, &dim);

        let top = generator.surface_y(0, 0);
        assert_eq!(world.block_at(&dim, IVec3::new(0, 0, 0)), BlockId::Bedrock);
        assert_eq!(world.block_at(&dim, IVec3::new(0, top - 1, 0)), BlockId::Dirt);
        assert!(world.block_at(&dim, IVec3::new(0, top, 0)).is_solid());
        assert_eq!(world.block_at(&dim, IVec3::new(0, top + 2, 0)), BlockId::Air);
    }
}
