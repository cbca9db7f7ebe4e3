//! Manages the WebGPU render pipeline for chunk meshes.
//!
//! The pipeline is built from WGSL source that is either read from the file
//! named in the configuration or taken from the shader compiled into the
//! binary. Creation runs inside a validation error scope so a broken shader
//! file is reported as a [`ResourceError`] and replaced by the built-in one
//! instead of aborting the device.
//!
//! # Resource Management
//!
//! Besides the pipeline this struct owns the depth texture, which has to
//! follow the surface size and is recreated by [`PipelineManager::resize`].

use std::path::Path;

use log::{info, warn};
use wgpu::{Device, RenderPipeline, SurfaceConfiguration};

use super::{bind_group_state::BindGroupState, texture, vertex::Vertex};
use crate::error::{InitError, ResourceError};

/// Chunk shader compiled into the binary.
pub const BUILTIN_SHADER: &str = include_str!("../../../assets/shaders/chunk.wgsl");

/// Render pipeline plus the depth buffer it draws against.
pub struct PipelineManager {
    pub render_pipeline: RenderPipeline,
    /// Depth texture used for depth testing
    pub depth_texture: texture::Texture,
}

impl PipelineManager {
    /// Creates the chunk pipeline.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `config` - Surface configuration containing size and format
    /// * `bind_group_state` - Layouts for the camera, atlas and chunk groups
    /// * `shader_path` - Optional WGSL file replacing [`BUILTIN_SHADER`]
    ///
    /// # Errors
    /// Fails only when the built-in shader itself is rejected.
    pub fn new(
        device: &Device,
        config: &SurfaceConfiguration,
        bind_group_state: &BindGroupState,
        shader_path: Option<&Path>,
    ) -> Result<Self, InitError> {
        let custom = shader_path.and_then(|path| {
            load_shader_source(path)
                .and_then(|source| Self::create_pipeline(device, config, bind_group_state, &source))
                .map(|pipeline| {
                    info!("Using chunk shader {}", path.display());
                    pipeline
                })
                .map_err(|e| warn!("{e}; using built-in chunk shader"))
                .ok()
        });

        let render_pipeline = match custom {
            Some(pipeline) => pipeline,
            None => Self::create_pipeline(device, config, bind_group_state, BUILTIN_SHADER)
                .map_err(|e| InitError::BuiltinShader(e.to_string()))?,
        };

        let depth_texture = texture::Texture::create_depth_texture(device, config, "DEPTH TEXTURE");

        Ok(Self {
            render_pipeline,
            depth_texture,
        })
    }

    fn create_pipeline(
        device: &Device,
        config: &SurfaceConfiguration,
        bind_group_state: &BindGroupState,
        source: &str,
    ) -> Result<RenderPipeline, ResourceError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Chunk Shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Chunk Pipeline Layout"),
            bind_group_layouts: &bind_group_state.layouts(),
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Chunk Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: texture::Texture::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        match pollster::block_on(device.pop_error_scope()) {
            Some(error) => Err(ResourceError::Shader(error.to_string())),
            None => Ok(render_pipeline),
        }
    }

    /// Handles window resize events by recreating the depth texture.
    pub fn resize(&mut self, device: &Device, config: &SurfaceConfiguration) {
        self.depth_texture = texture::Texture::create_depth_texture(device, config, "DEPTH TEXTURE");
    }
}

/// Reads WGSL source from `path`.
pub fn load_shader_source(path: &Path) -> Result<String, ResourceError> {
    std::fs::read_to_string(path).map_err(|source| ResourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_shader_has_both_entry_points() {
        assert!(BUILTIN_SHADER.contains("fn vs_main"));
        assert!(BUILTIN_SHADER.contains("fn fs_main"));
    }

    #[test]
    fn builtin_shader_binds_three_groups() {
        for group in ["@group(0)", "@group(1)", "@group(2)"] {
            assert!(BUILTIN_SHADER.contains(group), "missing {group}");
        }
    }

    #[test]
    fn missing_shader_file_is_a_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_shader_source(&dir.path().join("absent.wgsl"));
        assert!(matches!(result, Err(ResourceError::Io { .. })));
    }

    #[test]
    fn shader_file_is_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.wgsl");
        std::fs::write(&path, BUILTIN_SHADER).unwrap();
        assert_eq!(load_shader_source(&path).unwrap(), BUILTIN_SHADER);
    }
}
