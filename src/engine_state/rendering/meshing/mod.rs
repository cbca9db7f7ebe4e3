//! Mesh generation for voxel rendering.
//!
//! This module converts a chunk's block data into GPU-ready geometry. Every
//! face of a non-air block becomes one quad unless the cell on the other side
//! is opaque.
//!
//! Each face is shaded with the sky light of the cell it looks into and
//! tinted with the colour of its column's biome (grass tops and leaves only).
//!
//! # Architecture
//! - [`Mesh`]: vertices and indices for one chunk
//! - [`Face`]: the four corners of a single block face
//! - [`OcclusionGrid`]: padded opacity mask covering the chunk and the
//!   boundary layers of its neighbours
//!
//! # Boundaries
//! Cells in a neighbour that is not loaded count as air, so the faces on that
//! boundary are emitted. Once the neighbour arrives the chunk is marked dirty
//! and the hidden faces disappear on the next rebuild. Faces looking into a
//! neighbour that is not loaded, or a chunk that has not been lit yet, are
//! drawn at full light.
//!
//! # Usage
//! ```ignore
//! let neighbours = world.neighbours(coordinate);
//! let biomes = generator.biome_columns(coordinate);
//! let mesh = build_mesh(world.get_chunk(coordinate).unwrap(), neighbours, &biomes);
//! ```

pub mod face;
pub mod mesh;
pub mod occlusion;

pub use face::Face;
pub use mesh::Mesh;
pub use occlusion::OcclusionGrid;

use crate::engine_state::voxels::biome::BiomeColumns;
use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::chunk::{Chunk, CHUNK_DIMENSION};
use crate::engine_state::voxels::coordinates::LocalCoordinate;
use crate::engine_state::voxels::lighting::MAX_LIGHT;

/// Builds the mesh of `chunk`. `neighbours` are the six face-adjacent chunks
/// in [`BlockSide`] order; `biomes` are the biomes of the chunk's columns.
///
/// The output depends only on the inputs: the same blocks always give the
/// same vertices and indices in the same order. The returned mesh has version 0.
pub fn build_mesh(
    chunk: &Chunk,
    neighbours: [Option<&Chunk>; 6],
    biomes: &BiomeColumns,
) -> Mesh {
    let mut mesh = Mesh::new();
    if chunk.is_empty() {
        return mesh;
    }

    let grid = OcclusionGrid::new(chunk, &neighbours);

    for (local, block) in chunk.solid_blocks() {
        let biome = biomes.get(local.x, local.z);
        for side in BlockSide::all() {
            let facing = local + side.offset();
            if grid.is_opaque(facing) {
                continue;
            }
            let light = light_at(chunk, &neighbours, side, facing);
            let face = Face::new(local, side, block.texture_index(side))
                .shaded(light, block.tint(side, biome));
            mesh.push_face(&face);
        }
    }

    mesh
}

/// Sky light of `cell`, which lies inside `chunk` or one step past its `side` face.
fn light_at(
    chunk: &Chunk,
    neighbours: &[Option<&Chunk>; 6],
    side: BlockSide,
    cell: LocalCoordinate,
) -> u8 {
    if Chunk::contains(cell) {
        return chunk.light().map_or(MAX_LIGHT, |map| map.get(cell));
    }
    let wrapped = cell - side.offset() * CHUNK_DIMENSION;
    neighbours[side as usize]
        .and_then(|neighbour| neighbour.light())
        .map_or(MAX_LIGHT, |map| map.get(wrapped))
}
