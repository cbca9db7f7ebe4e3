//! Mesh data structures for chunk rendering.

use super::face::Face;
use crate::engine_state::rendering::texture::{ATLAS_COLUMNS, ATLAS_ROWS};
use crate::engine_state::rendering::Vertex;
use crate::engine_state::voxels::lighting::MAX_LIGHT;

/// CPU-side geometry for one chunk.
///
/// `version` is stamped by the chunk manager each time a mesh is built, and
/// is what the GPU buffer cache compares to decide whether to upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub version: u64,
}

impl Mesh {
    pub fn new() -> Self {
        Mesh::default()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn face_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Bytes taken by the vertex and index data once uploaded.
    pub fn byte_size(&self) -> u64 {
        (std::mem::size_of_val(self.vertices.as_slice())
            + std::mem::size_of_val(self.indices.as_slice())) as u64
    }

    /// Appends one quad.
    pub fn push_face(&mut self, face: &Face) {
        let base = self.vertices.len() as u32;
        let normal = face.block_side.normal();
        let uvs = Self::tile_uvs(face.tile);
        let light = f32::from(face.light) / f32::from(MAX_LIGHT);

        for (corner, uv) in face.corners().iter().zip(uvs) {
            self.vertices.push(Vertex {
                position: [corner.x as f32, corner.y as f32, corner.z as f32],
                normal,
                uv,
                tint: face.tint,
                light,
            });
        }
        self.indices.extend_from_slice(&Self::generate_face_indices(base));
    }

    /// Two triangles over four vertices starting at `base`.
    pub fn generate_face_indices(base: u32) -> [u32; 6] {
        [base, base + 1, base + 3, base, base + 3, base + 2]
    }

    /// Atlas coordinates of the ll, lr, ul, ur corners of a tile. V grows
    /// downwards in texture space, so the lower corners get the larger v.
    fn tile_uvs(tile: u16) -> [[f32; 2]; 4] {
        let tile = u32::from(tile) % (ATLAS_COLUMNS * ATLAS_ROWS);
        let u0 = (tile % ATLAS_COLUMNS) as f32 / ATLAS_COLUMNS as f32;
        let v0 = (tile / ATLAS_COLUMNS) as f32 / ATLAS_ROWS as f32;
        let u1 = u0 + 1.0 / ATLAS_COLUMNS as f32;
        let v1 = v0 + 1.0 / ATLAS_ROWS as f32;
        [[u0, v1], [u1, v1], [u0, v0], [u1, v0]]
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::engine_state::voxels::block::block_side::BlockSide;

    #[test]
    fn faces_use_the_two_triangle_pattern() {
        let mut mesh = Mesh::new();
        mesh.push_face(&Face::new(Point3::new(0, 0, 0), BlockSide::TOP, 0));
        mesh.push_face(&Face::new(Point3::new(0, 0, 0), BlockSide::BOTTOM, 0));

        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.indices, vec![0, 1, 3, 0, 3, 2, 4, 5, 7, 4, 7, 6]);
    }

    #[test]
    fn shading_is_copied_to_every_corner() {
        let mut mesh = Mesh::new();
        let face = Face::new(Point3::new(0, 0, 0), BlockSide::TOP, 3).shaded(6, [0.5, 0.75, 0.25]);
        mesh.push_face(&face);
        for vertex in &mesh.vertices {
            assert_eq!(vertex.light, 0.4);
            assert_eq!(vertex.tint, [0.5, 0.75, 0.25]);
        }
    }

    #[test]
    fn uvs_stay_inside_the_tile() {
        let mut mesh = Mesh::new();
        mesh.push_face(&Face::new(Point3::new(0, 0, 0), BlockSide::TOP, 5));
        for vertex in &mesh.vertices {
            assert!((0.25..=0.5).contains(&vertex.uv[0]));
            assert!((0.25..=0.5).contains(&vertex.uv[1]));
        }
    }
}
