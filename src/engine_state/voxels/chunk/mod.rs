//! # Chunk Module
//!
//! This module provides the `Chunk` struct which stores a 16x16x16 block of
//! voxel data along with the bookkeeping the chunk manager needs: a dirty
//! flag, a block-data version, the sky light computed for the last remesh and
//! the last mesh built from it.
//!
//! ## Layout
//!
//! Blocks are stored densely in x-fastest order, then y, then z:
//!
//! ```text
//! index = x + CHUNK_DIMENSION * y + CHUNK_PLANE_SIZE * z
//! ```
//!
//! A running count of non-air blocks lets fully empty chunks be skipped by the
//! mesher and by persistence without scanning the array.

use cgmath::Point3;

use super::block::Block;
use super::coordinates::{ChunkCoordinate, LocalCoordinate};
use super::lighting::LightMap;
use crate::engine_state::rendering::meshing::mesh::Mesh;

pub mod chunk_iteration;

/// The dimension (width, height, depth) of a chunk in blocks.
pub const CHUNK_DIMENSION: i32 = 16;
/// The number of blocks in a single 2D plane of a chunk (CHUNK_DIMENSION²).
pub const CHUNK_PLANE_SIZE: i32 = CHUNK_DIMENSION * CHUNK_DIMENSION;
/// The total number of blocks in a chunk (CHUNK_DIMENSION³).
pub const CHUNK_SIZE: i32 = CHUNK_PLANE_SIZE * CHUNK_DIMENSION;

/// Represents a 16x16x16 collection of voxel blocks in the world.
///
/// Chunks are owned by [`World`](super::world::World). Everything else refers
/// to a chunk by its coordinate.
#[derive(Debug)]
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    pub position: ChunkCoordinate,
    blocks: Vec<Block>,
    non_air: u32,
    /// Incremented on every block change. Persisted with the chunk.
    version: u64,
    dirty: bool,
    /// Set once block data diverges from what the terrain generator produced.
    edited: bool,
    light: Option<LightMap>,
    mesh: Option<Mesh>,
}

impl Chunk {
    /// Creates a new, completely empty chunk (all blocks are air).
    pub fn empty(position: ChunkCoordinate) -> Self {
        Chunk {
            position,
            blocks: vec![Block::AIR; CHUNK_SIZE as usize],
            non_air: 0,
            version: 0,
            dirty: false,
            edited: false,
            light: None,
            mesh: None,
        }
    }

    /// Builds a chunk from a full block array in storage order.
    ///
    /// Returns `None` when `blocks` does not hold exactly [`CHUNK_SIZE`] entries.
    pub fn from_blocks(position: ChunkCoordinate, blocks: Vec<Block>) -> Option<Self> {
        if blocks.len() != CHUNK_SIZE as usize {
            return None;
        }
        let non_air = blocks.iter().filter(|block| !block.is_air()).count() as u32;
        Some(Chunk {
            position,
            blocks,
            non_air,
            version: 0,
            dirty: false,
            edited: false,
            light: None,
            mesh: None,
        })
    }

    /// Returns whether a local coordinate lies inside the chunk.
    pub fn contains(local: LocalCoordinate) -> bool {
        (0..CHUNK_DIMENSION).contains(&local.x)
            && (0..CHUNK_DIMENSION).contains(&local.y)
            && (0..CHUNK_DIMENSION).contains(&local.z)
    }

    /// Storage index of a local coordinate. The coordinate must be inside the chunk.
    pub fn index(local: LocalCoordinate) -> usize {
        (local.x + CHUNK_DIMENSION * local.y + CHUNK_PLANE_SIZE * local.z) as usize
    }

    /// Inverse of [`Chunk::index`].
    pub fn local_from_index(index: usize) -> LocalCoordinate {
        let index = index as i32;
        Point3::new(
            index % CHUNK_DIMENSION,
            (index / CHUNK_DIMENSION) % CHUNK_DIMENSION,
            index / CHUNK_PLANE_SIZE,
        )
    }

    /// Gets the block at the specified chunk-relative coordinates.
    ///
    /// Coordinates outside the chunk read as air.
    pub fn get_block(&self, local: LocalCoordinate) -> Block {
        if !Self::contains(local) {
            return Block::AIR;
        }
        self.blocks[Self::index(local)]
    }

    /// Writes a block and returns whether anything changed.
    ///
    /// A change bumps the version and marks the chunk as edited. The dirty
    /// flag is left to [`World`](super::world::World), which owns the remesh queue.
    pub fn set_block(&mut self, local: LocalCoordinate, block: Block) -> bool {
        if !Self::contains(local) {
            return false;
        }
        let slot = &mut self.blocks[Self::index(local)];
        if *slot == block {
            return false;
        }

        match (slot.is_air(), block.is_air()) {
            (true, false) => self.non_air += 1,
            (false, true) => self.non_air -= 1,
            _ => {}
        }
        *slot = block;
        self.version += 1;
        self.edited = true;
        true
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Whether every block in the chunk is air.
    pub fn is_empty(&self) -> bool {
        self.non_air == 0
    }

    pub fn non_air_count(&self) -> u32 {
        self.non_air
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Restores the version of a chunk read back from disk.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    pub fn is_edited(&self) -> bool {
        self.edited
    }

    pub fn set_edited(&mut self, edited: bool) {
        self.edited = edited;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Sets the dirty flag. Returns `true` if the chunk was clean before.
    pub(super) fn mark_dirty(&mut self) -> bool {
        !std::mem::replace(&mut self.dirty, true)
    }

    pub(super) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Sky light as of the last remesh. `None` until the chunk is first lit.
    pub fn light(&self) -> Option<&LightMap> {
        self.light.as_ref()
    }

    /// Replaces the light map, returning the previous one.
    pub fn set_light(&mut self, light: LightMap) -> Option<LightMap> {
        self.light.replace(light)
    }

    /// The last mesh built for this chunk. A dirty chunk keeps its previous
    /// mesh until it is rebuilt.
    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    pub fn set_mesh(&mut self, mesh: Mesh) {
        self.mesh = Some(mesh);
    }

    pub fn take_mesh(&mut self) -> Option<Mesh> {
        self.mesh.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::BlockType;

    #[test]
    fn index_round_trips_through_local_coordinates() {
        for index in [0usize, 1, 15, 16, 255, 256, 4095] {
            let local = Chunk::local_from_index(index);
            assert!(Chunk::contains(local));
            assert_eq!(Chunk::index(local), index);
        }
    }

    #[test]
    fn set_block_tracks_version_and_non_air_count() {
        let mut chunk = Chunk::empty(Point3::new(0, 0, 0));
        let local = Point3::new(3, 4, 5);

        assert!(chunk.set_block(local, Block::new(BlockType::STONE)));
        assert_eq!(chunk.non_air_count(), 1);
        assert_eq!(chunk.version(), 1);
        assert!(chunk.is_edited());

        assert!(!chunk.set_block(local, Block::new(BlockType::STONE)));
        assert_eq!(chunk.version(), 1);

        assert!(chunk.set_block(local, Block::AIR));
        assert!(chunk.is_empty());
        assert_eq!(chunk.version(), 2);
    }

    #[test]
    fn out_of_range_reads_are_air() {
        let chunk = Chunk::from_blocks(
            Point3::new(0, 0, 0),
            vec![Block::new(BlockType::DIRT); CHUNK_SIZE as usize],
        )
        .unwrap();
        assert_eq!(chunk.get_block(Point3::new(-1, 0, 0)), Block::AIR);
        assert_eq!(chunk.get_block(Point3::new(0, 16, 0)), Block::AIR);
        assert_eq!(chunk.non_air_count(), CHUNK_SIZE as u32);
    }

    #[test]
    fn from_blocks_rejects_wrong_length() {
        assert!(Chunk::from_blocks(Point3::new(0, 0, 0), vec![Block::AIR; 10]).is_none());
    }
}
