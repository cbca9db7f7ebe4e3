//! # Sky Light
//!
//! Per-cell sky light for one chunk, from 0 (dark) to [`MAX_LIGHT`].
//!
//! Light is computed in two passes:
//!
//! 1. **Columns**: every column starts with the level entering through the
//!    chunk's top face and keeps it downwards until the first opaque block.
//!    Everything below that block starts dark.
//! 2. **Flood fill**: lit cells spread into non-opaque neighbours. A step
//!    sideways or up costs one level; a step down costs nothing, so light
//!    that reaches under an overhang keeps falling at the level it got there.
//!
//! Opaque cells are always dark. The fill stays inside the chunk; light
//! crosses chunk borders only vertically, through the top face.
//!
//! Light maps are derived data. They are not persisted and are rebuilt
//! before every remesh.

use std::collections::VecDeque;

use cgmath::Point3;

use super::block::block_side::BlockSide;
use super::chunk::{Chunk, CHUNK_DIMENSION, CHUNK_SIZE};
use super::coordinates::LocalCoordinate;

/// Full daylight.
pub const MAX_LIGHT: u8 = 15;

/// Sky light of every cell in a chunk, in chunk storage order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightMap {
    levels: Vec<u8>,
}

/// What lies above a chunk's top face.
#[derive(Debug, Clone, Copy)]
pub enum SkyAbove<'a> {
    /// Nothing above: every column enters at full light.
    Open,
    /// Assumed to be solid ground: nothing enters.
    Covered,
    /// A lit chunk: each column enters at the level of the cell above it.
    Chunk(&'a LightMap),
}

impl LightMap {
    pub fn dark() -> Self {
        LightMap {
            levels: vec![0; CHUNK_SIZE as usize],
        }
    }

    /// Light at `local`. Cells outside the chunk read as dark.
    pub fn get(&self, local: LocalCoordinate) -> u8 {
        if !Chunk::contains(local) {
            return 0;
        }
        self.levels[Chunk::index(local)]
    }

    fn set(&mut self, local: LocalCoordinate, level: u8) {
        self.levels[Chunk::index(local)] = level;
    }

    /// Whether the `y = 0` layers of both maps hold the same levels. The
    /// chunk below only has to be relit when they do not.
    pub fn bottom_layer_matches(&self, other: &LightMap) -> bool {
        (0..CHUNK_DIMENSION).all(|z| {
            (0..CHUNK_DIMENSION).all(|x| {
                let local = Point3::new(x, 0, z);
                self.get(local) == other.get(local)
            })
        })
    }
}

/// Computes the sky light of `chunk`.
pub fn sky_light(chunk: &Chunk, above: SkyAbove<'_>) -> LightMap {
    let mut map = LightMap::dark();
    let mut queue = VecDeque::new();
    let top = CHUNK_DIMENSION - 1;

    for z in 0..CHUNK_DIMENSION {
        for x in 0..CHUNK_DIMENSION {
            let mut level = match above {
                SkyAbove::Open => MAX_LIGHT,
                SkyAbove::Covered => 0,
                SkyAbove::Chunk(lit) => lit.get(Point3::new(x, 0, z)),
            };
            for y in (0..=top).rev() {
                let local = Point3::new(x, y, z);
                if chunk.get_block(local).is_opaque() {
                    level = 0;
                }
                if level > 0 {
                    map.set(local, level);
                    queue.push_back(local);
                }
            }
        }
    }

    while let Some(cell) = queue.pop_front() {
        let current = map.get(cell);
        for side in BlockSide::all() {
            let next = cell + side.offset();
            if !Chunk::contains(next) || chunk.get_block(next).is_opaque() {
                continue;
            }
            let level = if side == BlockSide::BOTTOM {
                current
            } else {
                current.saturating_sub(1)
            };
            if level > 0 && map.get(next) < level {
                map.set(next, level);
                queue.push_back(next);
            }
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::{block_type::BlockType, Block};

    /// A stone roof at y = 10 covering x in 0..8 across the whole chunk depth.
    fn overhang() -> Chunk {
        let mut chunk = Chunk::empty(Point3::new(0, 0, 0));
        for x in 0..8 {
            for z in 0..CHUNK_DIMENSION {
                chunk.set_block(Point3::new(x, 10, z), Block::new(BlockType::STONE));
            }
        }
        chunk
    }

    #[test]
    fn open_columns_are_fully_lit() {
        let map = sky_light(&Chunk::empty(Point3::new(0, 0, 0)), SkyAbove::Open);
        assert_eq!(map.get(Point3::new(0, 0, 0)), MAX_LIGHT);
        assert_eq!(map.get(Point3::new(15, 15, 15)), MAX_LIGHT);
    }

    #[test]
    fn light_falls_off_under_an_overhang() {
        let map = sky_light(&overhang(), SkyAbove::Open);

        assert_eq!(map.get(Point3::new(4, 11, 8)), MAX_LIGHT);
        assert_eq!(map.get(Point3::new(4, 10, 8)), 0);
        assert_eq!(map.get(Point3::new(12, 5, 8)), MAX_LIGHT);
        // One step in from the edge of the roof, then straight down.
        assert_eq!(map.get(Point3::new(7, 5, 8)), 14);
        assert_eq!(map.get(Point3::new(7, 0, 8)), 14);
        assert_eq!(map.get(Point3::new(2, 5, 8)), 9);
        assert_eq!(map.get(Point3::new(0, 9, 8)), 7);
    }

    #[test]
    fn transparent_blocks_let_light_through() {
        let mut chunk = Chunk::empty(Point3::new(0, 0, 0));
        chunk.set_block(Point3::new(3, 8, 3), Block::new(BlockType::LEAVES));
        let map = sky_light(&chunk, SkyAbove::Open);
        assert_eq!(map.get(Point3::new(3, 8, 3)), MAX_LIGHT);
        assert_eq!(map.get(Point3::new(3, 2, 3)), MAX_LIGHT);
    }

    #[test]
    fn covered_chunks_are_dark() {
        let map = sky_light(&overhang(), SkyAbove::Covered);
        assert_eq!(map, LightMap::dark());
    }

    #[test]
    fn light_enters_from_the_chunk_above() {
        let upper = sky_light(&overhang(), SkyAbove::Open);
        let lower = sky_light(&Chunk::empty(Point3::new(0, -1, 0)), SkyAbove::Chunk(&upper));

        assert_eq!(lower.get(Point3::new(12, 15, 8)), MAX_LIGHT);
        assert_eq!(lower.get(Point3::new(2, 0, 8)), 9);
        assert!(lower.bottom_layer_matches(&upper));
        assert!(!lower.bottom_layer_matches(&LightMap::dark()));
    }
}
