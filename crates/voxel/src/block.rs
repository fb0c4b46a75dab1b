//! Block materials for the voxel world.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Block type for voxel terrain. Names follow the host registry's identifiers
/// (without namespace), so keyword matching on [`BlockId::name`] works the same
/// against a real host as against [`crate::SimWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[repr(u8)]
pub enum BlockId {
    Air = 0,
    Stone,
    Deepslate,
    Cobblestone,
    Dirt,
    GrassBlock,
    Sand,
    Gravel,
    Clay,
    Water,
    Lava,
    /// Full snow block.
    SnowBlock,
    /// Thin snow layer sitting on top of another block.
    SnowLayer,
    Ice,
    /// Bottom layer of the world.
    Bedrock,
    Obsidian,
    Barrier,
    OakLog,
    OakPlanks,
    OakLeaves,
    Glass,
    ShortGrass,
    TallGrass,
    Fern,
    Dandelion,
}

impl BlockId {
    pub const ALL: [BlockId; 25] = [
        BlockId::Air,
        BlockId::Stone,
        BlockId::Deepslate,
        BlockId::Cobblestone,
        BlockId::Dirt,
        BlockId::GrassBlock,
        BlockId::Sand,
        BlockId::Gravel,
        BlockId::Clay,
        BlockId::Water,
        BlockId::Lava,
        BlockId::SnowBlock,
        BlockId::SnowLayer,
        BlockId::Ice,
        BlockId::Bedrock,
        BlockId::Obsidian,
        BlockId::Barrier,
        BlockId::OakLog,
        BlockId::OakPlanks,
        BlockId::OakLeaves,
        BlockId::Glass,
        BlockId::ShortGrass,
        BlockId::TallGrass,
        BlockId::Fern,
        BlockId::Dandelion,
    ];

    /// Registry name, e.g. `grass_block`.
    pub fn name(self) -> &'static str {
        match self {
            BlockId::Air => "air",
            BlockId::Stone => "stone",
            BlockId::Deepslate => "deepslate",
            BlockId::Cobblestone => "cobblestone",
            BlockId::Dirt => "dirt",
            BlockId::GrassBlock => "grass_block",
            BlockId::Sand => "sand",
            BlockId::Gravel => "gravel",
            BlockId::Clay => "clay",
            BlockId::Water => "water",
            BlockId::Lava => "lava",
            BlockId::SnowBlock => "snow_block",
            BlockId::SnowLayer => "snow",
            BlockId::Ice => "ice",
            BlockId::Bedrock => "bedrock",
            BlockId::Obsidian => "obsidian",
            BlockId::Barrier => "barrier",
            BlockId::OakLog => "oak_log",
            BlockId::OakPlanks => "oak_planks",
            BlockId::OakLeaves => "oak_leaves",
            BlockId::Glass => "glass",
            BlockId::ShortGrass => "short_grass",
            BlockId::TallGrass => "tall_grass",
            BlockId::Fern => "fern",
            BlockId::Dandelion => "dandelion",
        }
    }

    pub fn is_air(self) -> bool {
        self == BlockId::Air
    }

    pub fn is_liquid(self) -> bool {
        matches!(self, BlockId::Water | BlockId::Lava)
    }

    pub fn is_snow_layer(self) -> bool {
        self == BlockId::SnowLayer
    }

    /// Small plants that a snow layer replaces outright.
    pub fn is_foliage(self) -> bool {
        matches!(
            self,
            BlockId::ShortGrass | BlockId::TallGrass | BlockId::Fern | BlockId::Dandelion
        )
    }

    /// Blocks entities collide with.
    pub fn is_solid(self) -> bool {
        !(self.is_air() || self.is_liquid() || self.is_foliage() || self.is_snow_layer())
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlockId {
    type Err = String;

    /// Accepts namespaced (`minecraft:stone`) or bare names.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let name = raw.rsplit_once(':').map(|(_, n)| n).unwrap_or(raw);
        BlockId::ALL
            .iter()
            .copied()
            .find(|b| b.name() == name)
            .ok_or_else(|| format!("unknown block `{raw}`"))
    }
}

impl TryFrom<String> for BlockId {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<BlockId> for String {
    fn from(block: BlockId) -> Self {
        block.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_parse() {
        for block in BlockId::ALL {
            assert_eq!(block.name().parse::<BlockId>(), Ok(block));
        }
        assert_eq!("minecraft:bedrock".parse::<BlockId>(), Ok(BlockId::Bedrock));
        assert!("unobtainium".parse::<BlockId>().is_err());
    }

    #[test]
    fn classification() {
        assert!(BlockId::Water.is_liquid());
        assert!(!BlockId::SnowLayer.is_solid());
        assert!(BlockId::Fern.is_foliage());
        assert!(BlockId::Stone.is_solid());
        assert!(!BlockId::Air.is_solid());
    }
}
