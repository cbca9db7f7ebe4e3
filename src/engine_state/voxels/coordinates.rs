//! # Coordinate Spaces
//!
//! Blocks and chunks are both addressed with integer triples. A block
//! coordinate maps to its chunk by floor division and to its cell inside the
//! chunk by floor modulo, so negative coordinates land in the chunk below
//! rather than in chunk zero.

use cgmath::{Point3, Vector3};

use super::chunk::CHUNK_DIMENSION;

/// Position of a chunk on the chunk grid.
pub type ChunkCoordinate = Point3<i32>;

/// Position of a block in world space.
pub type BlockCoordinate = Point3<i32>;

/// Position of a block inside its chunk. Every component is in `0..CHUNK_DIMENSION`.
pub type LocalCoordinate = Point3<i32>;

/// Returns the chunk that owns `block`.
pub fn chunk_of(block: BlockCoordinate) -> ChunkCoordinate {
    Point3::new(
        block.x.div_euclid(CHUNK_DIMENSION),
        block.y.div_euclid(CHUNK_DIMENSION),
        block.z.div_euclid(CHUNK_DIMENSION),
    )
}

/// Returns the position of `block` inside its chunk.
pub fn local_of(block: BlockCoordinate) -> LocalCoordinate {
    Point3::new(
        block.x.rem_euclid(CHUNK_DIMENSION),
        block.y.rem_euclid(CHUNK_DIMENSION),
        block.z.rem_euclid(CHUNK_DIMENSION),
    )
}

/// World-space position of the chunk's minimum corner block.
pub fn chunk_origin(chunk: ChunkCoordinate) -> BlockCoordinate {
    Point3::new(
        chunk.x * CHUNK_DIMENSION,
        chunk.y * CHUNK_DIMENSION,
        chunk.z * CHUNK_DIMENSION,
    )
}

/// Chunk containing a world-space point such as the camera eye.
pub fn chunk_at_position(position: Point3<f32>) -> ChunkCoordinate {
    let size = CHUNK_DIMENSION as f32;
    Point3::new(
        (position.x / size).floor() as i32,
        (position.y / size).floor() as i32,
        (position.z / size).floor() as i32,
    )
}

/// Block containing a world-space point.
pub fn block_at_position(position: Point3<f32>) -> BlockCoordinate {
    Point3::new(
        position.x.floor() as i32,
        position.y.floor() as i32,
        position.z.floor() as i32,
    )
}

/// Chebyshev distance between two chunks. A chunk is within load radius `r`
/// of the centre when this is at most `r`.
pub fn chunk_distance(a: ChunkCoordinate, b: ChunkCoordinate) -> i32 {
    let d: Vector3<i32> = a - b;
    d.x.abs().max(d.y.abs()).max(d.z.abs())
}

/// Squared euclidean distance between two chunks, used to order loading.
pub fn chunk_distance_squared(a: ChunkCoordinate, b: ChunkCoordinate) -> i32 {
    let d: Vector3<i32> = a - b;
    d.x * d.x + d.y * d.y + d.z * d.z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_blocks_floor_into_lower_chunk() {
        let block = Point3::new(-1, -16, -17);
        assert_eq!(chunk_of(block), Point3::new(-1, -1, -2));
        assert_eq!(local_of(block), Point3::new(15, 0, 15));
    }

    #[test]
    fn origin_and_local_recompose_block() {
        for block in [
            Point3::new(0, 0, 0),
            Point3::new(31, -5, 100),
            Point3::new(-33, 17, -1),
        ] {
            let origin = chunk_origin(chunk_of(block));
            let local = local_of(block);
            assert_eq!(
                Point3::new(origin.x + local.x, origin.y + local.y, origin.z + local.z),
                block
            );
        }
    }

    #[test]
    fn camera_position_floors_to_chunk() {
        assert_eq!(
            chunk_at_position(Point3::new(-0.5, 15.9, 16.0)),
            Point3::new(-1, 0, 1)
        );
    }
}
