//! Manages WebGPU bind groups and their layouts.
//!
//! The chunk shader reads three groups:
//!
//! | group | contents                          | lifetime          |
//! |-------|-----------------------------------|-------------------|
//! | 0     | camera uniform                    | whole run         |
//! | 1     | atlas texture and sampler         | whole run         |
//! | 2     | chunk origin uniform              | one per chunk mesh |
//!
//! Groups 0 and 1 are created here. Group 2 only has its layout here; the
//! bind groups themselves are made by the chunk buffer cache on upload.

use wgpu::{BindGroup, BindGroupLayout, Device};

use super::texture::Texture;

pub const CAMERA_BIND_GROUP: &str = "camera_bind_group";
pub const CAMERA_BIND_GROUP_LAYOUT: &str = "camera_bind_group_layout";
pub const TEXTURE_BIND_GROUP: &str = "texture_bind_group";
pub const TEXTURE_BIND_GROUP_LAYOUT: &str = "texture_bind_group_layout";
pub const CHUNK_BIND_GROUP_LAYOUT: &str = "chunk_bind_group_layout";

/// Bind groups and layouts shared by every chunk draw.
pub struct BindGroupState {
    pub camera_layout: BindGroupLayout,
    pub camera_bind_group: BindGroup,
    pub texture_layout: BindGroupLayout,
    pub texture_bind_group: BindGroup,
    pub chunk_layout: BindGroupLayout,
}

impl BindGroupState {
    /// Creates the camera and atlas bind groups and the per-chunk layout.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `camera_buffer` - Uniform buffer holding the camera uniform
    /// * `atlas` - The uploaded texture atlas
    pub fn new(device: &Device, camera_buffer: &wgpu::Buffer, atlas: &Texture) -> Self {
        let (camera_bind_group, camera_layout) =
            Self::generate_camera_bindgroups(device, camera_buffer);
        let (texture_bind_group, texture_layout) =
            Self::generate_texture_bindgroups(device, atlas);
        let chunk_layout = Self::generate_chunk_layout(device);

        Self {
            camera_layout,
            camera_bind_group,
            texture_layout,
            texture_bind_group,
            chunk_layout,
        }
    }

    /// Layouts in group order, as the pipeline layout expects them.
    pub fn layouts(&self) -> [&BindGroupLayout; 3] {
        [&self.camera_layout, &self.texture_layout, &self.chunk_layout]
    }

    fn generate_camera_bindgroups(
        device: &Device,
        camera_buffer: &wgpu::Buffer,
    ) -> (BindGroup, BindGroupLayout) {
        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some(CAMERA_BIND_GROUP_LAYOUT),
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some(CAMERA_BIND_GROUP),
        });

        (camera_bind_group, camera_bind_group_layout)
    }

    fn generate_texture_bindgroups(device: &Device, atlas: &Texture) -> (BindGroup, BindGroupLayout) {
        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
                label: Some(TEXTURE_BIND_GROUP_LAYOUT),
            });

        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&atlas.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&atlas.sampler),
                },
            ],
            label: Some(TEXTURE_BIND_GROUP),
        });

        (texture_bind_group, texture_bind_group_layout)
    }

    fn generate_chunk_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some(CHUNK_BIND_GROUP_LAYOUT),
        })
    }
}
