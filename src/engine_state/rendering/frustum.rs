//! Frustum culling for chunk rendering.
//!
//! Extracts the six clip planes from a view-projection matrix and tests chunk
//! bounding boxes against them. The matrix is expected to map depth to
//! `0..1`, as wgpu does.

use cgmath::{Matrix4, Point3, Vector3, Vector4};

use crate::engine_state::voxels::chunk::CHUNK_DIMENSION;
use crate::engine_state::voxels::coordinates::{chunk_origin, ChunkCoordinate};

/// A plane `n . p + d = 0` with the normal pointing into the frustum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector3<f32>,
    pub d: f32,
}

impl Plane {
    fn from_row(row: Vector4<f32>) -> Self {
        let normal = Vector3::new(row.x, row.y, row.z);
        let length = (normal.x * normal.x + normal.y * normal.y + normal.z * normal.z).sqrt();
        if length > 0.0 {
            Plane {
                normal: normal / length,
                d: row.w / length,
            }
        } else {
            Plane { normal, d: row.w }
        }
    }

    /// Signed distance from the plane; positive on the inside.
    pub fn distance_to_point(&self, point: Point3<f32>) -> f32 {
        self.normal.x * point.x + self.normal.y * point.y + self.normal.z * point.z + self.d
    }
}

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn for_chunk(coordinate: ChunkCoordinate) -> Self {
        let origin = chunk_origin(coordinate).cast::<f32>().unwrap_or(Point3::new(0.0, 0.0, 0.0));
        let size = CHUNK_DIMENSION as f32;
        Aabb {
            min: origin,
            max: Point3::new(origin.x + size, origin.y + size, origin.z + size),
        }
    }
}

/// View frustum as six planes: left, right, bottom, top, near, far.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Builds the frustum of a combined `projection * view` matrix.
    pub fn from_view_projection(m: &Matrix4<f32>) -> Self {
        // cgmath stores columns; gather rows for the Gribb-Hartmann extraction.
        let row = |i: usize| Vector4::new(m.x[i], m.y[i], m.z[i], m.w[i]);
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Frustum {
            planes: [
                Plane::from_row(r3 + r0),
                Plane::from_row(r3 - r0),
                Plane::from_row(r3 + r1),
                Plane::from_row(r3 - r1),
                Plane::from_row(r2),
                Plane::from_row(r3 - r2),
            ],
        }
    }

    /// Returns false only when the box is entirely outside one plane.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            // The box corner furthest along the plane normal.
            let positive = Point3::new(
                if plane.normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if plane.normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if plane.normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            plane.distance_to_point(positive) >= 0.0
        })
    }

    pub fn contains_chunk(&self, coordinate: ChunkCoordinate) -> bool {
        self.intersects_aabb(&Aabb::for_chunk(coordinate))
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{perspective, Deg, Matrix4, Point3, Vector3};

    use super::*;
    use crate::engine_state::camera_state::camera::OPENGL_TO_WGPU_MATRIX;

    fn looking_down_positive_x() -> Frustum {
        let view = Matrix4::look_to_rh(
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::unit_y(),
        );
        let projection = OPENGL_TO_WGPU_MATRIX * perspective(Deg(70.0), 1.0, 0.1, 500.0);
        Frustum::from_view_projection(&(projection * view))
    }

    #[test]
    fn chunks_in_front_are_visible() {
        let frustum = looking_down_positive_x();
        assert!(frustum.contains_chunk(Point3::new(2, 0, 0)));
        assert!(frustum.contains_chunk(Point3::new(2, -1, -1)));
    }

    #[test]
    fn chunks_behind_the_camera_are_rejected() {
        let frustum = looking_down_positive_x();
        assert!(!frustum.contains_chunk(Point3::new(-3, 0, 0)));
        assert!(!frustum.contains_chunk(Point3::new(-2, -1, -1)));
    }

    #[test]
    fn chunks_beyond_far_plane_and_sideways_are_rejected() {
        let frustum = looking_down_positive_x();
        assert!(!frustum.contains_chunk(Point3::new(40, 0, 0)));
        assert!(!frustum.contains_chunk(Point3::new(1, 0, 10)));
    }

    #[test]
    fn chunk_containing_the_camera_is_visible() {
        let frustum = looking_down_positive_x();
        assert!(frustum.contains_chunk(Point3::new(0, 0, 0)));
        assert!(frustum.contains_chunk(Point3::new(0, -1, -1)));
    }
}
