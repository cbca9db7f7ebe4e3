//! Vertex data structures and layouts for voxel rendering.
//!
//! This module defines the vertex format used for chunk meshes and the
//! matching wgpu buffer layout.

/// A single chunk mesh vertex.
///
/// Positions are relative to the chunk origin; the per-chunk uniform in the
/// shader moves them into world space. `tint` is the biome colour multiplied
/// into the texel and `light` the sky light of the face, scaled to `0..=1`.
///
/// # Memory Layout
/// `#[repr(C)]` with `Pod` so a `Vec<Vertex>` can be cast straight into a
/// vertex buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tint: [f32; 3],
    pub light: f32,
}

impl Vertex {
    /// Returns the vertex buffer layout matching the chunk shader inputs.
    ///
    /// | location | attribute | format    |
    /// |----------|-----------|-----------|
    /// | 0        | position  | Float32x3 |
    /// | 1        | normal    | Float32x3 |
    /// | 2        | uv        | Float32x2 |
    /// | 3        | tint      | Float32x3 |
    /// | 4        | light     | Float32   |
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 11]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_covers_the_whole_vertex() {
        let layout = Vertex::desc();
        assert_eq!(layout.array_stride, 48);
        let last = layout.attributes.last().unwrap();
        assert_eq!(last.offset + last.format.size(), layout.array_stride);
    }
}
