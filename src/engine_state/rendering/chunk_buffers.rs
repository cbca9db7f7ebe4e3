//! GPU residency of chunk meshes.
//!
//! [`ChunkBufferCache`] keeps one set of GPU buffers per chunk and uploads a
//! chunk's mesh only when its version differs from the one already resident.
//! The actual buffer work goes through a [`MeshBackend`], so the bookkeeping
//! runs the same against wgpu and against a recording backend in tests.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use super::meshing::Mesh;
use crate::engine_state::voxels::coordinates::{chunk_origin, ChunkCoordinate};

/// Creates and destroys the GPU objects backing one chunk mesh.
pub trait MeshBackend {
    type Handle;

    /// Uploads `mesh`, which is never empty, for the chunk at `coordinate`.
    fn upload(&mut self, coordinate: ChunkCoordinate, mesh: &Mesh) -> Self::Handle;

    fn destroy(&mut self, handle: Self::Handle);
}

/// Anything that can drop the GPU copy of a chunk mesh.
///
/// The chunk manager calls this when a chunk leaves the load radius.
pub trait MeshResidency {
    fn release(&mut self, coordinate: ChunkCoordinate);
}

struct Resident<H> {
    version: u64,
    bytes: u64,
    /// `None` for an empty mesh, which needs no buffers.
    handle: Option<H>,
}

/// Tracks which mesh version of each chunk lives on the GPU.
pub struct ChunkBufferCache<B: MeshBackend> {
    backend: B,
    resident: HashMap<ChunkCoordinate, Resident<B::Handle>>,
    upload_count: u64,
    bytes_resident: u64,
}

impl<B: MeshBackend> ChunkBufferCache<B> {
    pub fn new(backend: B) -> Self {
        ChunkBufferCache {
            backend,
            resident: HashMap::new(),
            upload_count: 0,
            bytes_resident: 0,
        }
    }

    /// Makes sure the GPU holds `mesh` for `coordinate`, uploading it if the
    /// resident version differs. Returns the handle to draw with, or `None`
    /// when the mesh has no geometry.
    pub fn sync(&mut self, coordinate: ChunkCoordinate, mesh: &Mesh) -> Option<&B::Handle> {
        let current = self
            .resident
            .get(&coordinate)
            .map(|resident| resident.version);

        if current != Some(mesh.version) {
            self.release(coordinate);

            let handle = if mesh.is_empty() {
                None
            } else {
                self.upload_count += 1;
                Some(self.backend.upload(coordinate, mesh))
            };
            let bytes = if handle.is_some() { mesh.byte_size() } else { 0 };
            self.bytes_resident += bytes;
            self.resident.insert(
                coordinate,
                Resident {
                    version: mesh.version,
                    bytes,
                    handle,
                },
            );
        }

        self.get(coordinate)
    }

    pub fn get(&self, coordinate: ChunkCoordinate) -> Option<&B::Handle> {
        self.resident
            .get(&coordinate)
            .and_then(|resident| resident.handle.as_ref())
    }

    /// Version of the mesh resident for `coordinate`.
    pub fn resident_version(&self, coordinate: ChunkCoordinate) -> Option<u64> {
        self.resident.get(&coordinate).map(|resident| resident.version)
    }

    /// Drops the buffers of `coordinate`. Returns whether anything was resident.
    pub fn release(&mut self, coordinate: ChunkCoordinate) -> bool {
        match self.resident.remove(&coordinate) {
            Some(resident) => {
                self.bytes_resident -= resident.bytes;
                if let Some(handle) = resident.handle {
                    self.backend.destroy(handle);
                }
                true
            }
            None => false,
        }
    }

    pub fn release_all(&mut self) {
        let coordinates: Vec<ChunkCoordinate> = self.resident.keys().copied().collect();
        for coordinate in coordinates {
            self.release(coordinate);
        }
    }

    /// Total number of uploads since creation.
    pub fn upload_count(&self) -> u64 {
        self.upload_count
    }

    pub fn bytes_resident(&self) -> u64 {
        self.bytes_resident
    }

    pub fn resident_count(&self) -> usize {
        self.resident.len()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: MeshBackend> MeshResidency for ChunkBufferCache<B> {
    fn release(&mut self, coordinate: ChunkCoordinate) {
        ChunkBufferCache::release(self, coordinate);
    }
}

/// Per-chunk uniform: the chunk's world-space origin.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ChunkUniform {
    pub origin: [f32; 4],
}

impl ChunkUniform {
    pub fn for_chunk(coordinate: ChunkCoordinate) -> Self {
        let origin = chunk_origin(coordinate);
        ChunkUniform {
            origin: [origin.x as f32, origin.y as f32, origin.z as f32, 0.0],
        }
    }
}

/// GPU buffers of one uploaded chunk mesh.
pub struct ChunkGpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    origin_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

/// [`MeshBackend`] writing real wgpu buffers.
pub struct WgpuMeshBackend {
    device: wgpu::Device,
    chunk_layout: wgpu::BindGroupLayout,
}

impl WgpuMeshBackend {
    pub fn new(device: wgpu::Device, chunk_layout: wgpu::BindGroupLayout) -> Self {
        WgpuMeshBackend {
            device,
            chunk_layout,
        }
    }
}

impl MeshBackend for WgpuMeshBackend {
    type Handle = ChunkGpuMesh;

    fn upload(&mut self, coordinate: ChunkCoordinate, mesh: &Mesh) -> ChunkGpuMesh {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("chunk_vertex_buffer"),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("chunk_index_buffer"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        let origin_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("chunk_origin_buffer"),
                contents: bytemuck::cast_slice(&[ChunkUniform::for_chunk(coordinate)]),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.chunk_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: origin_buffer.as_entire_binding(),
            }],
            label: Some("chunk_bind_group"),
        });

        ChunkGpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            origin_buffer,
            bind_group,
        }
    }

    fn destroy(&mut self, handle: ChunkGpuMesh) {
        handle.vertex_buffer.destroy();
        handle.index_buffer.destroy();
        handle.origin_buffer.destroy();
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::engine_state::rendering::meshing::Face;
    use crate::engine_state::voxels::block::block_side::BlockSide;

    /// Records uploads and destroys instead of touching a GPU.
    #[derive(Default)]
    struct RecordingBackend {
        next_handle: u32,
        uploads: Vec<(ChunkCoordinate, u64)>,
        destroyed: Vec<u32>,
    }

    impl MeshBackend for RecordingBackend {
        type Handle = u32;

        fn upload(&mut self, coordinate: ChunkCoordinate, mesh: &Mesh) -> u32 {
            self.uploads.push((coordinate, mesh.version));
            self.next_handle += 1;
            self.next_handle
        }

        fn destroy(&mut self, handle: u32) {
            self.destroyed.push(handle);
        }
    }

    fn mesh(version: u64, faces: usize) -> Mesh {
        let mut mesh = Mesh::new();
        for _ in 0..faces {
            mesh.push_face(&Face::new(Point3::new(0, 0, 0), BlockSide::TOP, 0));
        }
        mesh.version = version;
        mesh
    }

    #[test]
    fn uploads_once_per_mesh_version() {
        let mut cache = ChunkBufferCache::new(RecordingBackend::default());
        let coordinate = Point3::new(1, 0, -1);

        let first = mesh(1, 2);
        for _ in 0..5 {
            cache.sync(coordinate, &first);
        }
        let second = mesh(2, 3);
        for _ in 0..5 {
            cache.sync(coordinate, &second);
        }

        assert_eq!(cache.upload_count(), 2);
        assert_eq!(
            cache.backend().uploads,
            vec![(coordinate, 1), (coordinate, 2)]
        );
        assert_eq!(cache.backend().destroyed, vec![1]);
        assert_eq!(cache.bytes_resident(), second.byte_size());
    }

    #[test]
    fn empty_mesh_needs_no_buffers() {
        let mut cache = ChunkBufferCache::new(RecordingBackend::default());
        let coordinate = Point3::new(0, 0, 0);

        assert!(cache.sync(coordinate, &mesh(4, 0)).is_none());
        assert_eq!(cache.upload_count(), 0);
        assert_eq!(cache.resident_version(coordinate), Some(4));
    }

    #[test]
    fn release_destroys_and_forgets() {
        let mut cache = ChunkBufferCache::new(RecordingBackend::default());
        let a = Point3::new(0, 0, 0);
        let b = Point3::new(5, 0, 0);
        cache.sync(a, &mesh(1, 1));
        cache.sync(b, &mesh(1, 1));

        MeshResidency::release(&mut cache, b);
        assert!(cache.get(b).is_none());
        assert!(cache.get(a).is_some());
        assert!(!cache.release(b));

        cache.release_all();
        assert_eq!(cache.resident_count(), 0);
        assert_eq!(cache.bytes_resident(), 0);
        assert_eq!(cache.backend().destroyed.len(), 2);
    }

    #[test]
    fn chunk_uniform_holds_the_world_origin() {
        let uniform = ChunkUniform::for_chunk(Point3::new(-1, 2, 0));
        assert_eq!(uniform.origin, [-16.0, 32.0, 0.0, 0.0]);
    }
}
