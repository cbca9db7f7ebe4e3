use cgmath::Point3;

use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::coordinates::LocalCoordinate;
use crate::engine_state::voxels::lighting::MAX_LIGHT;

/// One visible block face, described by its four corners in chunk-local
/// space. Corners are named as seen from outside the block: lower-left,
/// lower-right, upper-left, upper-right. With indices `[ll, lr, ur]` and
/// `[ll, ur, ul]` every face winds counter-clockwise seen from outside.
///
/// A new face is fully lit and untinted; [`Face::shaded`] sets both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    pub ll: Point3<i32>,
    pub lr: Point3<i32>,
    pub ul: Point3<i32>,
    pub ur: Point3<i32>,
    pub tile: u16,
    pub block_side: BlockSide,
    /// Sky light of the cell the face looks into.
    pub light: u8,
    pub tint: [f32; 3],
}

impl Face {
    pub fn new(local: LocalCoordinate, block_side: BlockSide, tile: u16) -> Self {
        let (i, j, k) = (local.x, local.y, local.z);
        let (ll, lr, ul, ur) = match block_side {
            BlockSide::FRONT => (
                Point3::new(i, j, k),
                Point3::new(i, j, k + 1),
                Point3::new(i, j + 1, k),
                Point3::new(i, j + 1, k + 1),
            ),
            BlockSide::BACK => (
                Point3::new(i + 1, j, k + 1),
                Point3::new(i + 1, j, k),
                Point3::new(i + 1, j + 1, k + 1),
                Point3::new(i + 1, j + 1, k),
            ),
            BlockSide::BOTTOM => (
                Point3::new(i, j, k + 1),
                Point3::new(i, j, k),
                Point3::new(i + 1, j, k + 1),
                Point3::new(i + 1, j, k),
            ),
            BlockSide::TOP => (
                Point3::new(i, j + 1, k),
                Point3::new(i, j + 1, k + 1),
                Point3::new(i + 1, j + 1, k),
                Point3::new(i + 1, j + 1, k + 1),
            ),
            BlockSide::LEFT => (
                Point3::new(i + 1, j, k),
                Point3::new(i, j, k),
                Point3::new(i + 1, j + 1, k),
                Point3::new(i, j + 1, k),
            ),
            BlockSide::RIGHT => (
                Point3::new(i, j, k + 1),
                Point3::new(i + 1, j, k + 1),
                Point3::new(i, j + 1, k + 1),
                Point3::new(i + 1, j + 1, k + 1),
            ),
        };

        Face {
            ll,
            lr,
            ul,
            ur,
            tile,
            block_side,
            light: MAX_LIGHT,
            tint: [1.0; 3],
        }
    }

    pub fn shaded(self, light: u8, tint: [f32; 3]) -> Self {
        Face {
            light: light.min(MAX_LIGHT),
            tint,
            ..self
        }
    }

    /// Corners in vertex order: ll, lr, ul, ur.
    pub fn corners(&self) -> [Point3<i32>; 4] {
        [self.ll, self.lr, self.ul, self.ur]
    }
}
