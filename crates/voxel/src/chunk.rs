//! Fixed-size cubic chunks of block data.

use crate::BlockId;
use glam::IVec3;

/// Edge length of a chunk in blocks.
pub const CHUNK_SIZE: i32 = 16;
const CHUNK_VOLUME: usize = (CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE) as usize;

/// One chunk of voxel terrain, addressed by local coordinates.
#[derive(Debug, Clone)]
pub struct VoxelChunk {
    pub data: Vec<BlockId>,
    /// Count of non-air blocks, so empty chunks can be dropped.
    solid_count: usize,
}

impl Default for VoxelChunk {
    fn default() -> Self {
        Self::new()
    }
}

impl VoxelChunk {
    pub fn new() -> Self {
        Self {
            data: vec![BlockId::Air; CHUNK_VOLUME],
            solid_count: 0,
        }
    }

    /// Chunk coordinate containing world block `pos`.
    pub fn key_for(pos: IVec3) -> IVec3 {
        pos.div_euclid(IVec3::splat(CHUNK_SIZE))
    }

    /// Local coordinate of world block `pos` inside its chunk.
    pub fn local_for(pos: IVec3) -> IVec3 {
        pos.rem_euclid(IVec3::splat(CHUNK_SIZE))
    }

    pub fn index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        let n = CHUNK_SIZE as usize;
        ix + n * (iy + n * iz)
    }

    pub fn get(&self, ix: usize, iy: usize, iz: usize) -> BlockId {
        let n = CHUNK_SIZE as usize;
        if ix < n && iy < n && iz < n {
            self.data[self.index(ix, iy, iz)]
        } else {
            BlockId::Air
        }
    }

    pub fn set(&mut self, ix: usize, iy: usize, iz: usize, block: BlockId) {
        let n = CHUNK_SIZE as usize;
        if ix < n && iy < n && iz < n {
            let i = self.index(ix, iy, iz);
            let previous = self.data[i];
            if previous.is_air() && !block.is_air() {
                self.solid_count += 1;
            } else if !previous.is_air() && block.is_air() {
                self.solid_count -= 1;
            }
            self.data[i] = block;
        }
    }

    pub fn get_local(&self, local: IVec3) -> BlockId {
        if local.min_element() < 0 {
            return BlockId::Air;
        }
        self.get(local.x as usize, local.y as usize, local.z as usize)
    }

    pub fn set_local(&mut self, local: IVec3, block: BlockId) {
        if local.min_element() < 0 {
            return;
        }
        self.set(local.x as usize, local.y as usize, local.z as usize, block);
    }

    pub fn is_empty(&self) -> bool {
        self.solid_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_coordinates_map_into_chunk() {
        let pos = IVec3::new(-1, -17, 5);
        assert_eq!(VoxelChunk::key_for(pos), IVec3::new(-1, -2, 0));
        assert_eq!(VoxelChunk::local_for(pos), IVec3::new(15, 15, 5));
    }

    #[test]
    fn solid_count_tracks_writes() {
        let mut chunk = VoxelChunk::new();
        assert!(chunk.is_empty());
        chunk.set(1, 2, 3, BlockId::Stone);
        assert!(!chunk.is_empty());
        assert_eq!(chunk.get(1, 2, 3), BlockId::Stone);
        chunk.set(1, 2, 3, BlockId::Air);
        assert!(chunk.is_empty());
        assert_eq!(chunk.get(99, 0, 0), BlockId::Air);
    }
}
