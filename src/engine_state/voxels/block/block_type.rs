//! # Block Type Module
//!
//! This module defines the different types of blocks in the voxel world and
//! the static property table that the mesher and ray caster consult.

use num_derive::FromPrimitive;
use phf::phf_map;

use super::block_side::{Axis, BlockSide};
use super::BlockTypeSize;

/// Enumerates all known block types in the voxel world.
///
/// The discriminant is the id stored in chunk data and on disk, so variants
/// must never be reordered. The `FromPrimitive` derive converts stored ids
/// back into the enum.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockType {
    /// An air block, which is non-solid and transparent.
    AIR = 0,

    /// Bare rock found below the dirt layer.
    STONE = 1,

    /// A basic dirt block, used as a common building material.
    DIRT = 2,

    /// A grass block with different textures on top and sides.
    /// The top is green, sides have grass on dirt, and bottom is plain dirt.
    GRASS = 3,

    /// A log with bark on the sides and rings on the ends. Oriented along an axis.
    LOG = 4,

    /// Foliage. Solid for ray casts but does not hide neighbouring faces.
    LEAVES = 5,
}

impl BlockType {
    /// Converts a stored id into a `BlockType`, or `None` for ids this build
    /// does not know about.
    pub fn from_id(id: BlockTypeSize) -> Option<Self> {
        num_traits::FromPrimitive::from_u8(id)
    }

    /// Block types the player can cycle through, in hotbar order.
    pub fn placeable() -> [BlockType; 5] {
        [
            BlockType::STONE,
            BlockType::DIRT,
            BlockType::GRASS,
            BlockType::LOG,
            BlockType::LEAVES,
        ]
    }
}

/// How a block interacts with light and with the faces of its neighbours.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Opacity {
    Air,
    Opaque,
    Transparent,
}

/// Which biome colour a block's faces are multiplied with.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tint {
    None,
    /// Only the top face takes the grass colour.
    GrassTop,
    /// Every face takes the foliage colour.
    Foliage,
}

/// Static description of a block type.
#[derive(Debug)]
pub struct BlockProperties {
    pub name: &'static str,
    pub opacity: Opacity,
    /// Atlas tile per face, indexed by [`BlockSide`] as `usize`. For
    /// axis-aligned blocks this describes the upright (Y axis) orientation.
    pub faces: [u16; 6],
    /// Whether the block stores an orientation axis in its metadata.
    pub axis_aligned: bool,
    pub tint: Tint,
}

/// Atlas tile drawn for unknown block ids.
pub const MISSING_TILE: u16 = 15;

const fn uniform(tile: u16) -> [u16; 6] {
    [tile; 6]
}

/// Faces in [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT] order.
static BLOCK_PROPERTIES: phf::Map<u8, BlockProperties> = phf_map! {
    0u8 => BlockProperties {
        name: "air",
        opacity: Opacity::Air,
        faces: uniform(0),
        axis_aligned: false,
        tint: Tint::None,
    },
    1u8 => BlockProperties {
        name: "stone",
        opacity: Opacity::Opaque,
        faces: uniform(0),
        axis_aligned: false,
        tint: Tint::None,
    },
    2u8 => BlockProperties {
        name: "dirt",
        opacity: Opacity::Opaque,
        faces: uniform(1),
        axis_aligned: false,
        tint: Tint::None,
    },
    3u8 => BlockProperties {
        name: "grass",
        opacity: Opacity::Opaque,
        faces: [2, 2, 1, 3, 2, 2],
        axis_aligned: false,
        tint: Tint::GrassTop,
    },
    4u8 => BlockProperties {
        name: "log",
        opacity: Opacity::Opaque,
        faces: [4, 4, 5, 5, 4, 4],
        axis_aligned: true,
        tint: Tint::None,
    },
    5u8 => BlockProperties {
        name: "leaves",
        opacity: Opacity::Transparent,
        faces: uniform(6),
        axis_aligned: false,
        tint: Tint::Foliage,
    },
};

static UNKNOWN_PROPERTIES: BlockProperties = BlockProperties {
    name: "unknown",
    opacity: Opacity::Opaque,
    faces: uniform(MISSING_TILE),
    axis_aligned: false,
    tint: Tint::None,
};

/// Looks up the properties of a block id. Unknown ids are opaque and drawn
/// with the missing texture.
pub fn properties(id: BlockTypeSize) -> &'static BlockProperties {
    BLOCK_PROPERTIES.get(&id).unwrap_or(&UNKNOWN_PROPERTIES)
}

impl BlockProperties {
    /// Atlas tile for `side` of a block lying along `axis`.
    pub fn tile(&self, side: BlockSide, axis: Axis) -> u16 {
        if !self.axis_aligned {
            return self.faces[side as usize];
        }
        if side.axis() == axis {
            self.faces[BlockSide::TOP as usize]
        } else {
            self.faces[BlockSide::FRONT as usize]
        }
    }
}
