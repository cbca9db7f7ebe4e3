//! Padded opacity mask used for face culling.

use bitvec::prelude::BitVec;
use cgmath::Point3;

use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::chunk::{Chunk, CHUNK_DIMENSION};
use crate::engine_state::voxels::coordinates::LocalCoordinate;

/// The dimension of a chunk including an extra layer of cells on each side for neighbor lookups.
pub const CHUNK_DIMENSION_WRAPPED: usize = (CHUNK_DIMENSION + 2) as usize;
/// The number of cells in a wrapped 2D chunk plane.
pub const CHUNK_PLANE_SIZE_WRAPPED: usize = CHUNK_DIMENSION_WRAPPED * CHUNK_DIMENSION_WRAPPED;
/// The total number of cells in a wrapped chunk.
pub const CHUNK_SIZE_WRAPPED: usize = CHUNK_PLANE_SIZE_WRAPPED * CHUNK_DIMENSION_WRAPPED;

/// One bit per cell of an 18x18x18 cube: the chunk plus the boundary layer of
/// each face neighbour. A set bit means the cell hides faces behind it.
///
/// Edges and corners of the padding are never filled, as no face looks at them.
pub struct OcclusionGrid {
    opaque: BitVec,
}

impl OcclusionGrid {
    /// Builds the mask from a chunk and its neighbours in [`BlockSide`] order.
    /// A missing neighbour contributes an all-clear layer.
    pub fn new(chunk: &Chunk, neighbours: &[Option<&Chunk>; 6]) -> Self {
        let mut grid = OcclusionGrid {
            opaque: BitVec::repeat(false, CHUNK_SIZE_WRAPPED),
        };

        for (local, block) in chunk.solid_blocks() {
            if block.is_opaque() {
                grid.set(local);
            }
        }

        for side in BlockSide::all() {
            if let Some(neighbour) = neighbours[side as usize] {
                grid.fill_boundary(side, neighbour);
            }
        }

        grid
    }

    /// Copies the layer of `neighbour` that touches this chunk's `side` face.
    fn fill_boundary(&mut self, side: BlockSide, neighbour: &Chunk) {
        let last = CHUNK_DIMENSION - 1;
        for a in 0..CHUNK_DIMENSION {
            for b in 0..CHUNK_DIMENSION {
                let (source, target) = match side {
                    BlockSide::FRONT => (Point3::new(last, a, b), Point3::new(-1, a, b)),
                    BlockSide::BACK => (Point3::new(0, a, b), Point3::new(CHUNK_DIMENSION, a, b)),
                    BlockSide::BOTTOM => (Point3::new(a, last, b), Point3::new(a, -1, b)),
                    BlockSide::TOP => (Point3::new(a, 0, b), Point3::new(a, CHUNK_DIMENSION, b)),
                    BlockSide::LEFT => (Point3::new(a, b, last), Point3::new(a, b, -1)),
                    BlockSide::RIGHT => (Point3::new(a, b, 0), Point3::new(a, b, CHUNK_DIMENSION)),
                };
                if neighbour.get_block(source).is_opaque() {
                    self.set(target);
                }
            }
        }
    }

    fn index(local: LocalCoordinate) -> usize {
        (local.x + 1) as usize
            + CHUNK_DIMENSION_WRAPPED * (local.y + 1) as usize
            + CHUNK_PLANE_SIZE_WRAPPED * (local.z + 1) as usize
    }

    fn set(&mut self, local: LocalCoordinate) {
        self.opaque.set(Self::index(local), true);
    }

    /// Whether the cell at `local` hides faces. `local` may lie one cell
    /// outside the chunk on any axis.
    pub fn is_opaque(&self, local: LocalCoordinate) -> bool {
        self.opaque[Self::index(local)]
    }
}
