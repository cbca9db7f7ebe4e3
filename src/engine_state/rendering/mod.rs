//! Rendering system for the voxel engine.
//!
//! This module contains the core rendering functionality: mesh building, GPU
//! residency of chunk meshes, pipeline setup and the per-frame render pass.
//!
//! # Frame
//!
//! [`RenderPipeline::render_frame`] culls the visible chunks against the
//! camera frustum, makes sure each survivor's current mesh is on the GPU,
//! and issues one indexed draw per chunk with the chunk origin bound as a
//! uniform.

use log::{debug, warn};
use wgpu::{util::DeviceExt, Device, Queue, Surface, SurfaceConfiguration};

use bind_group_state::BindGroupState;
use chunk_buffers::{ChunkBufferCache, ChunkGpuMesh, WgpuMeshBackend};
use frustum::Frustum;
use pipeline_manager::PipelineManager;

use super::camera_state::{camera::CameraUniform, CameraState};
use super::voxels::coordinates::ChunkCoordinate;
use super::voxels::world::World;
use crate::config::RenderConfig;
use crate::error::{InitError, RenderError};

mod bind_group_state;
pub mod chunk_buffers;
pub mod frustum;
pub mod meshing;
mod pipeline_manager;
pub mod texture;
mod vertex;

// Re-export commonly used types
pub use vertex::Vertex;

/// Background colour behind the terrain.
const SKY: wgpu::Color = wgpu::Color {
    r: 0.53,
    g: 0.72,
    b: 0.92,
    a: 1.0,
};

/// What one call to [`RenderPipeline::render_frame`] drew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub drawn: usize,
    pub culled: usize,
    /// False when the frame was skipped because the surface was unavailable.
    pub presented: bool,
}

/// Owns the surface, device and every GPU resource used to draw chunks.
pub struct RenderPipeline {
    /// The WebGPU surface being rendered to
    surface: Surface<'static>,
    /// Configuration for the surface (size, format, etc.)
    surface_config: SurfaceConfiguration,
    device: Device,
    queue: Queue,
    pipeline_manager: PipelineManager,
    bind_group_state: BindGroupState,
    camera_buffer: wgpu::Buffer,
    _atlas: texture::Texture,
    chunk_buffers: ChunkBufferCache<WgpuMeshBackend>,
}

impl RenderPipeline {
    /// Creates a new `RenderPipeline`.
    ///
    /// This initializes:
    /// - The surface configuration
    /// - The camera uniform buffer
    /// - The texture atlas, or the placeholder if the file is unusable
    /// - The chunk pipeline, using the configured shader or the built-in one
    ///
    /// # Errors
    /// Returns [`InitError::BuiltinShader`] if the built-in shader is rejected.
    pub fn new(
        surface: Surface<'static>,
        surface_config: SurfaceConfiguration,
        device: Device,
        queue: Queue,
        render_config: &RenderConfig,
    ) -> Result<Self, InitError> {
        surface.configure(&device, &surface_config);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform::new()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let atlas_image = texture::load_atlas_or_placeholder(&render_config.atlas_path);
        let atlas = texture::Texture::from_atlas(&device, &queue, &atlas_image, "block_atlas");

        let bind_group_state = BindGroupState::new(&device, &camera_buffer, &atlas);
        let pipeline_manager = PipelineManager::new(
            &device,
            &surface_config,
            &bind_group_state,
            render_config.shader_path.as_deref(),
        )?;

        let backend = WgpuMeshBackend::new(device.clone(), bind_group_state.chunk_layout.clone());

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            pipeline_manager,
            bind_group_state,
            camera_buffer,
            _atlas: atlas,
            chunk_buffers: ChunkBufferCache::new(backend),
        })
    }

    /// Resizes the surface and depth buffer. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.reconfigure();
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.surface_config);
        self.pipeline_manager
            .resize(&self.device, &self.surface_config);
    }

    pub fn chunk_buffers(&self) -> &ChunkBufferCache<WgpuMeshBackend> {
        &self.chunk_buffers
    }

    pub fn chunk_buffers_mut(&mut self) -> &mut ChunkBufferCache<WgpuMeshBackend> {
        &mut self.chunk_buffers
    }

    /// Draws `visible` chunks of `world` from `camera` and presents the frame.
    ///
    /// A lost or outdated surface is reconfigured and a timed out one is
    /// skipped; both return stats with `presented == false`.
    ///
    /// # Errors
    /// [`RenderError::OutOfMemory`] when the surface cannot allocate, or
    /// [`RenderError::Surface`] for any other surface failure.
    pub fn render_frame(
        &mut self,
        camera: &CameraState,
        world: &World,
        visible: &[ChunkCoordinate],
    ) -> Result<FrameStats, RenderError> {
        let frustum = Frustum::from_view_projection(&camera.view_projection());
        let in_view: Vec<ChunkCoordinate> = visible
            .iter()
            .copied()
            .filter(|coordinate| frustum.contains_chunk(*coordinate))
            .collect();

        for coordinate in &in_view {
            if let Some(mesh) = world.get_chunk(*coordinate).and_then(|chunk| chunk.mesh()) {
                self.chunk_buffers.sync(*coordinate, mesh);
            }
        }

        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[camera.camera_uniform]),
        );

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("Surface lost or outdated, reconfiguring");
                self.reconfigure();
                return Ok(FrameStats::default());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Timed out waiting for the next frame, skipping");
                return Ok(FrameStats::default());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(e) => return Err(RenderError::Surface(e)),
        };

        let meshes: Vec<&ChunkGpuMesh> = in_view
            .iter()
            .filter_map(|coordinate| self.chunk_buffers.get(*coordinate))
            .collect();

        let view = frame.texture.create_view(&Default::default());
        let mut encoder = self.device.create_command_encoder(&Default::default());
        {
            let depth_stencil_attachment = Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.pipeline_manager.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            });
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(SKY),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment,
                ..Default::default()
            });

            rpass.set_pipeline(&self.pipeline_manager.render_pipeline);
            rpass.set_bind_group(0, &self.bind_group_state.camera_bind_group, &[]);
            rpass.set_bind_group(1, &self.bind_group_state.texture_bind_group, &[]);
            for mesh in &meshes {
                rpass.set_bind_group(2, &mesh.bind_group, &[]);
                rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                rpass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        let stats = FrameStats {
            drawn: meshes.len(),
            culled: visible.len() - in_view.len(),
            presented: true,
        };

        self.queue.submit([encoder.finish()]);
        frame.present();

        Ok(stats)
    }
}
