//! # World Module
//!
//! This module provides the `World` struct which owns every loaded chunk and
//! is the single authority for block data.
//!
//! ## Architecture
//!
//! The world uses a sparse storage approach where only chunks that have been
//! generated, loaded from disk, or written to are kept in memory. Lookups are
//! O(1) through a hash map keyed by chunk coordinate.
//!
//! ## Dirty Tracking
//!
//! Any change that can alter a chunk's mesh marks the chunk dirty and pushes
//! it onto a FIFO remesh queue. A chunk enters the queue only on the
//! transition from clean to dirty, so the queue never holds duplicates and
//! [`World::take_dirty`] hands out the chunks that have waited longest first.
//!
//! Edits on a chunk boundary also dirty the face-adjacent chunk whose boundary
//! layer touches the edited cell, since that chunk's culling depends on it.
//!
//! ## Threading
//!
//! `World` lives on the main thread. Generation workers never see it; they
//! hand finished chunks back to the chunk manager, which inserts them here.

use std::collections::{HashMap, VecDeque};

use cgmath::Point3;

use super::block::block_side::BlockSide;
use super::block::Block;
use super::chunk::{Chunk, CHUNK_DIMENSION};
use super::coordinates::{chunk_of, local_of, BlockCoordinate, ChunkCoordinate};
use crate::error::EditRejected;

/// Represents a voxel world composed of multiple chunks.
///
/// # Examples
///
/// ```ignore
/// let mut world = World::new();
///
/// world.set_block(Point3::new(-1, 0, 0), Block::new(BlockType::STONE));
/// assert_eq!(world.get_block(Point3::new(-1, 0, 0)).block_type, BlockType::STONE as u8);
/// assert!(world.is_loaded(Point3::new(-1, 0, 0)));
/// ```
#[derive(Default)]
pub struct World {
    chunks: HashMap<ChunkCoordinate, Chunk>,
    dirty_queue: VecDeque<ChunkCoordinate>,
}

impl World {
    /// Creates a new, empty world.
    pub fn new() -> Self {
        World {
            chunks: HashMap::new(),
            dirty_queue: VecDeque::new(),
        }
    }

    /// Returns the block at a world coordinate, or air if its chunk is not loaded.
    pub fn get_block(&self, block: BlockCoordinate) -> Block {
        self.chunks
            .get(&chunk_of(block))
            .map_or(Block::AIR, |chunk| chunk.get_block(local_of(block)))
    }

    /// Writes a block, creating its chunk as all air if it is not loaded.
    ///
    /// The owning chunk is marked dirty, along with every loaded chunk that
    /// shares a face with the edited cell.
    pub fn set_block(&mut self, block: BlockCoordinate, value: Block) {
        let chunk_coordinate = chunk_of(block);
        let local = local_of(block);

        let changed = self
            .chunks
            .entry(chunk_coordinate)
            .or_insert_with(|| Chunk::empty(chunk_coordinate))
            .set_block(local, value);

        if !changed {
            return;
        }

        self.mark_dirty(chunk_coordinate);
        for side in Self::boundary_sides(local) {
            self.mark_dirty(chunk_coordinate + side.offset());
        }
    }

    /// Writes a block into an already loaded chunk.
    ///
    /// This is the path used for player edits. Nothing is written if the
    /// owning chunk is not loaded.
    pub fn try_set_block(
        &mut self,
        block: BlockCoordinate,
        value: Block,
    ) -> Result<(), EditRejected> {
        let chunk = chunk_of(block);
        if !self.is_loaded(chunk) {
            return Err(EditRejected::ChunkNotLoaded { block, chunk });
        }
        self.set_block(block, value);
        Ok(())
    }

    /// Faces of the chunk whose boundary layer contains `local`.
    fn boundary_sides(local: Point3<i32>) -> impl Iterator<Item = BlockSide> {
        let last = CHUNK_DIMENSION - 1;
        [
            (local.x == 0, BlockSide::FRONT),
            (local.x == last, BlockSide::BACK),
            (local.y == 0, BlockSide::BOTTOM),
            (local.y == last, BlockSide::TOP),
            (local.z == 0, BlockSide::LEFT),
            (local.z == last, BlockSide::RIGHT),
        ]
        .into_iter()
        .filter_map(|(on_boundary, side)| on_boundary.then_some(side))
    }

    pub fn get_chunk(&self, coordinate: ChunkCoordinate) -> Option<&Chunk> {
        self.chunks.get(&coordinate)
    }

    pub fn get_chunk_mut(&mut self, coordinate: ChunkCoordinate) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coordinate)
    }

    pub fn is_loaded(&self, coordinate: ChunkCoordinate) -> bool {
        self.chunks.contains_key(&coordinate)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn loaded_coordinates(&self) -> impl Iterator<Item = ChunkCoordinate> + '_ {
        self.chunks.keys().copied()
    }

    /// Number of chunks waiting for a remesh.
    pub fn dirty_count(&self) -> usize {
        self.chunks.values().filter(|chunk| chunk.is_dirty()).count()
    }

    /// Inserts a chunk, replacing any chunk already at its coordinate.
    ///
    /// The new chunk and its loaded face neighbours are marked dirty, since
    /// the neighbours may now cull faces they previously had to draw.
    pub fn insert_chunk(&mut self, chunk: Chunk) -> Option<Chunk> {
        let coordinate = chunk.position;
        let previous = self.chunks.insert(coordinate, chunk);

        self.mark_dirty(coordinate);
        for side in BlockSide::all() {
            self.mark_dirty(coordinate + side.offset());
        }
        previous
    }

    /// Removes a chunk from the world and returns it.
    ///
    /// Callers holding GPU resources for the chunk must release them first.
    pub fn remove_chunk(&mut self, coordinate: ChunkCoordinate) -> Option<Chunk> {
        self.chunks.remove(&coordinate)
    }

    /// Marks a loaded chunk dirty. Unloaded coordinates are ignored.
    pub fn mark_dirty(&mut self, coordinate: ChunkCoordinate) {
        if let Some(chunk) = self.chunks.get_mut(&coordinate) {
            if chunk.mark_dirty() {
                self.dirty_queue.push_back(coordinate);
            }
        }
    }

    /// Takes up to `budget` dirty chunks, oldest first, and clears their dirty flag.
    ///
    /// Queue entries for chunks that were removed in the meantime are dropped.
    pub fn take_dirty(&mut self, budget: usize) -> Vec<ChunkCoordinate> {
        let mut taken = Vec::with_capacity(budget.min(self.dirty_queue.len()));
        while taken.len() < budget {
            let Some(coordinate) = self.dirty_queue.pop_front() else {
                break;
            };
            if let Some(chunk) = self.chunks.get_mut(&coordinate) {
                if chunk.is_dirty() {
                    chunk.clear_dirty();
                    taken.push(coordinate);
                }
            }
        }
        taken
    }

    /// The six face neighbours of a chunk in [`BlockSide`] order.
    pub fn neighbours(&self, coordinate: ChunkCoordinate) -> [Option<&Chunk>; 6] {
        BlockSide::all().map(|side| self.chunks.get(&(coordinate + side.offset())))
    }

    /// Iterates over every loaded chunk.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.chunks.values()
    }

    /// Removes every chunk, returning them. Used at shutdown.
    pub fn drain(&mut self) -> Vec<Chunk> {
        self.dirty_queue.clear();
        self.chunks.drain().map(|(_, chunk)| chunk).collect()
    }
}
