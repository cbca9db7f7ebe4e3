//! # Block Module
//!
//! This module provides the core block-related functionality for the voxel engine.
//! It includes block type definitions, block face handling, and block data structures.

use block_side::{Axis, BlockSide};
use block_type::{properties, BlockProperties, BlockType, Opacity, Tint};

use super::biome::Biome;

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in memory.
/// This is used for efficient storage and serialization of block data.
pub type BlockTypeSize = u8;

const AXIS_MASK: u8 = 0b0000_0011;
const LIGHT_SHIFT: u8 = 4;

/// Represents a single voxel block in the world.
///
/// This is a lightweight structure that stores only the essential block data.
/// The actual block properties are looked up from the block type.
///
/// # Memory Layout
/// The `#[repr(C)]` attribute ensures a consistent two byte layout, which is
/// also the order the chunk file format stores ids and metadata in.
///
/// # Metadata
/// - bits 0..2: orientation [`Axis`] for axis-aligned blocks
/// - bits 4..8: block light level, carried through storage. Sky light is not
///   stored per block; see [`LightMap`](super::lighting::LightMap).
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq, Eq, Hash, Default)]
pub struct Block {
    /// The type of this block, encoded as a `BlockTypeSize` for compact storage.
    pub block_type: BlockTypeSize,
    pub metadata: u8,
}

impl Block {
    pub const AIR: Block = Block {
        block_type: BlockType::AIR as BlockTypeSize,
        metadata: 0,
    };

    /// Creates a new block of the specified type with empty metadata.
    pub fn new(block_type: BlockType) -> Self {
        Block {
            block_type: block_type as BlockTypeSize,
            metadata: 0,
        }
    }

    /// Returns a copy of this block oriented along `axis`. Blocks without an
    /// orientation are returned unchanged.
    pub fn with_axis(self, axis: Axis) -> Self {
        if !self.properties().axis_aligned {
            return self;
        }
        Block {
            metadata: (self.metadata & !AXIS_MASK) | axis as u8,
            ..self
        }
    }

    pub fn axis(&self) -> Axis {
        Axis::from_bits(self.metadata & AXIS_MASK)
    }

    pub fn light(&self) -> u8 {
        self.metadata >> LIGHT_SHIFT
    }

    pub fn kind(&self) -> Option<BlockType> {
        BlockType::from_id(self.block_type)
    }

    pub fn properties(&self) -> &'static BlockProperties {
        properties(self.block_type)
    }

    pub fn is_air(&self) -> bool {
        self.properties().opacity == Opacity::Air
    }

    /// Whether this block hides the faces of blocks next to it.
    pub fn is_opaque(&self) -> bool {
        self.properties().opacity == Opacity::Opaque
    }

    /// Colour multiplied into the given face in `biome`. Untinted faces get white.
    pub fn tint(&self, side: BlockSide, biome: Biome) -> [f32; 3] {
        match self.properties().tint {
            Tint::GrassTop if side == BlockSide::TOP => biome.grass_tint(),
            Tint::Foliage => biome.foliage_tint(),
            _ => [1.0; 3],
        }
    }

    /// Atlas tile for the given face, taking orientation into account.
    pub fn texture_index(&self, side: BlockSide) -> u16 {
        self.properties().tile(side, self.axis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_only_applies_to_axis_aligned_blocks() {
        let log = Block::new(BlockType::LOG).with_axis(Axis::Z);
        assert_eq!(log.axis(), Axis::Z);
        assert_eq!(log.texture_index(BlockSide::LEFT), 5);

        let dirt = Block::new(BlockType::DIRT).with_axis(Axis::Z);
        assert_eq!(dirt.metadata, 0);
    }

    #[test]
    fn grass_tops_and_leaves_follow_the_biome() {
        let grass = Block::new(BlockType::GRASS);
        assert_eq!(grass.tint(BlockSide::TOP, Biome::Plains), Biome::Plains.grass_tint());
        assert_eq!(grass.tint(BlockSide::FRONT, Biome::Plains), [1.0; 3]);
        assert_ne!(
            grass.tint(BlockSide::TOP, Biome::Plains),
            grass.tint(BlockSide::TOP, Biome::Mountains)
        );

        let leaves = Block::new(BlockType::LEAVES);
        assert_eq!(
            leaves.tint(BlockSide::BOTTOM, Biome::Temperate),
            Biome::Temperate.foliage_tint()
        );
        assert_eq!(Block::new(BlockType::STONE).tint(BlockSide::TOP, Biome::Plains), [1.0; 3]);
    }

    #[test]
    fn leaves_are_solid_but_not_opaque() {
        let leaves = Block::new(BlockType::LEAVES);
        assert!(!leaves.is_air());
        assert!(!leaves.is_opaque());
        assert!(Block::AIR.is_air());
    }
}
