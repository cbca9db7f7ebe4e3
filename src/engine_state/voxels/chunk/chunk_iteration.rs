//! # Chunk Iteration Module
//!
//! Iteration over the solid contents of a chunk. Fully empty chunks yield
//! nothing without touching the block array.

use super::Chunk;
use crate::engine_state::voxels::block::Block;
use crate::engine_state::voxels::coordinates::LocalCoordinate;

/// Iterator over every non-air block of a chunk, in storage order.
///
/// # Examples
///
/// ```ignore
/// for (local, block) in ChunkBlockIterator::new(&chunk) {
///     println!("{local:?}: {block:?}");
/// }
/// ```
pub struct ChunkBlockIterator<'a> {
    blocks: std::iter::Enumerate<std::slice::Iter<'a, Block>>,
    remaining: u32,
}

impl<'a> ChunkBlockIterator<'a> {
    pub fn new(chunk_ref: &'a Chunk) -> Self {
        ChunkBlockIterator {
            blocks: chunk_ref.blocks().iter().enumerate(),
            remaining: chunk_ref.non_air_count(),
        }
    }
}

impl<'a> Iterator for ChunkBlockIterator<'a> {
    type Item = (LocalCoordinate, Block);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        for (index, block) in self.blocks.by_ref() {
            if !block.is_air() {
                self.remaining -= 1;
                return Some((Chunk::local_from_index(index), *block));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

impl Chunk {
    /// Iterates over the non-air blocks of the chunk.
    pub fn solid_blocks(&self) -> ChunkBlockIterator<'_> {
        ChunkBlockIterator::new(self)
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::engine_state::voxels::block::block_type::BlockType;

    #[test]
    fn yields_only_solid_blocks_in_storage_order() {
        let mut chunk = Chunk::empty(Point3::new(0, 0, 0));
        chunk.set_block(Point3::new(0, 0, 1), Block::new(BlockType::DIRT));
        chunk.set_block(Point3::new(2, 0, 0), Block::new(BlockType::STONE));

        let found: Vec<_> = chunk.solid_blocks().collect();
        assert_eq!(
            found,
            vec![
                (Point3::new(2, 0, 0), Block::new(BlockType::STONE)),
                (Point3::new(0, 0, 1), Block::new(BlockType::DIRT)),
            ]
        );
    }

    #[test]
    fn empty_chunk_yields_nothing() {
        let chunk = Chunk::empty(Point3::new(0, 0, 0));
        assert_eq!(chunk.solid_blocks().count(), 0);
    }
}
