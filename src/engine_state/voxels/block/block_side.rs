//! # Block Side Module
//!
//! This module defines the six faces of a voxel block and the axis each one
//! lies on. Faces are used both by the mesher, to decide which quads to emit,
//! and by the ray caster, to report which face a ray entered through.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel block.
///
/// Each variant is assigned a stable integer value used to index per-face
/// tables such as [`BlockProperties::faces`](super::BlockProperties).
///
/// The order is: [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The front face (facing negative X)
    FRONT = 0,

    /// The back face (facing positive X)
    BACK = 1,

    /// The bottom face (facing negative Y)
    BOTTOM = 2,

    /// The top face (facing positive Y)
    TOP = 3,

    /// The left face (facing negative Z)
    LEFT = 4,

    /// The right face (facing positive Z)
    RIGHT = 5,
}

/// One of the three world axes. Stored in the low bits of block metadata for
/// blocks that have an orientation.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, Default)]
pub enum Axis {
    #[default]
    Y = 0,
    X = 1,
    Z = 2,
}

impl Axis {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            1 => Axis::X,
            2 => Axis::Z,
            _ => Axis::Y,
        }
    }
}

impl BlockSide {
    /// Returns an array containing all six block faces in a consistent order.
    ///
    /// The order is: [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT]
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::LEFT,
            BlockSide::RIGHT,
        ]
    }

    /// Offset from a block to the neighbour that shares this face.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            BlockSide::FRONT => Vector3::new(-1, 0, 0),
            BlockSide::BACK => Vector3::new(1, 0, 0),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::LEFT => Vector3::new(0, 0, -1),
            BlockSide::RIGHT => Vector3::new(0, 0, 1),
        }
    }

    /// Outward unit normal of the face.
    pub fn normal(self) -> [f32; 3] {
        let offset = self.offset();
        [offset.x as f32, offset.y as f32, offset.z as f32]
    }

    /// The face on the neighbouring block that touches this one.
    pub fn opposite(self) -> BlockSide {
        match self {
            BlockSide::FRONT => BlockSide::BACK,
            BlockSide::BACK => BlockSide::FRONT,
            BlockSide::BOTTOM => BlockSide::TOP,
            BlockSide::TOP => BlockSide::BOTTOM,
            BlockSide::LEFT => BlockSide::RIGHT,
            BlockSide::RIGHT => BlockSide::LEFT,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            BlockSide::FRONT | BlockSide::BACK => Axis::X,
            BlockSide::BOTTOM | BlockSide::TOP => Axis::Y,
            BlockSide::LEFT | BlockSide::RIGHT => Axis::Z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_faces_cancel_out() {
        for side in BlockSide::all() {
            assert_eq!(side.opposite().opposite(), side);
            assert_eq!(side.offset() + side.opposite().offset(), Vector3::new(0, 0, 0));
            assert_eq!(side.axis(), side.opposite().axis());
        }
    }
}
