//! Voxel ray casting.
//!
//! Walks the grid cell by cell along a ray (Amanatides and Woo) and stops at
//! the first solid cell. Used to find the block the player is looking at.

use cgmath::{InnerSpace, Point3, Vector3};

use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::coordinates::{block_at_position, BlockCoordinate};

/// The first solid cell along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub block: BlockCoordinate,
    /// Face of `block` the ray entered through. `None` when the ray started
    /// inside the block.
    pub face: Option<BlockSide>,
    /// Distance from the ray origin to the entry point.
    pub distance: f32,
}

impl RaycastHit {
    /// Cell in front of the hit face, where a placed block would go.
    pub fn adjacent(&self) -> Option<BlockCoordinate> {
        self.face.map(|face| self.block + face.offset())
    }
}

/// Face crossed when stepping into a cell along `axis` in direction `step`.
fn entry_face(axis: usize, step: i32) -> BlockSide {
    match (axis, step > 0) {
        (0, true) => BlockSide::FRONT,
        (0, false) => BlockSide::BACK,
        (1, true) => BlockSide::BOTTOM,
        (1, false) => BlockSide::TOP,
        (_, true) => BlockSide::LEFT,
        (_, false) => BlockSide::RIGHT,
    }
}

/// Casts a ray from `origin` along `direction` for at most `reach` blocks.
///
/// `is_solid` decides which cells stop the ray.
pub fn raycast<F>(
    origin: Point3<f32>,
    direction: Vector3<f32>,
    reach: f32,
    is_solid: F,
) -> Option<RaycastHit>
where
    F: Fn(BlockCoordinate) -> bool,
{
    let length = direction.magnitude();
    if !(length > f32::EPSILON) || !(reach > 0.0) {
        return None;
    }
    let direction = direction / length;

    let start = block_at_position(origin);
    if is_solid(start) {
        return Some(RaycastHit {
            block: start,
            face: None,
            distance: 0.0,
        });
    }

    let origin = [origin.x, origin.y, origin.z];
    let direction = [direction.x, direction.y, direction.z];
    let mut cell = [start.x, start.y, start.z];
    let mut step = [0i32; 3];
    let mut t_max = [f32::INFINITY; 3];
    let mut t_delta = [f32::INFINITY; 3];

    for axis in 0..3 {
        let d = direction[axis];
        if d > 0.0 {
            step[axis] = 1;
            t_max[axis] = ((cell[axis] + 1) as f32 - origin[axis]) / d;
            t_delta[axis] = 1.0 / d;
        } else if d < 0.0 {
            step[axis] = -1;
            t_max[axis] = (origin[axis] - cell[axis] as f32) / -d;
            t_delta[axis] = -1.0 / d;
        }
    }

    loop {
        let axis = if t_max[0] <= t_max[1] && t_max[0] <= t_max[2] {
            0
        } else if t_max[1] <= t_max[2] {
            1
        } else {
            2
        };

        let distance = t_max[axis];
        if distance > reach {
            return None;
        }

        cell[axis] += step[axis];
        t_max[axis] += t_delta[axis];

        let block = Point3::new(cell[0], cell[1], cell[2]);
        if is_solid(block) {
            return Some(RaycastHit {
                block,
                face: Some(entry_face(axis, step[axis])),
                distance,
            });
        }
    }
}
