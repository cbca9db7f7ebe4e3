//! # Graphics Resources Builder
//!
//! Creates the window and the wgpu context behind it. Adapter and device
//! requests are async in wgpu and are driven to completion with `pollster`.

use std::sync::Arc;

use log::info;
use wgpu::{Device, Queue, Surface, SurfaceConfiguration};
use winit::{dpi::PhysicalSize, event_loop::ActiveEventLoop, window::Window};

use crate::{config::WindowConfig, error::InitError};

/// Everything needed to render into the window.
pub struct Graphics {
    pub window: Arc<Window>,
    pub surface: Surface<'static>,
    pub surface_config: SurfaceConfiguration,
    pub device: Device,
    pub queue: Queue,
}

/// Opens the window and brings up a device that can present to it.
///
/// # Errors
/// Any [`InitError`] raised while creating the window, surface, adapter or device.
pub fn create_graphics(
    event_loop: &ActiveEventLoop,
    window_config: &WindowConfig,
) -> Result<Graphics, InitError> {
    let window_attrs = Window::default_attributes()
        .with_title(window_config.title.clone())
        .with_inner_size(PhysicalSize::new(window_config.width, window_config.height));
    let window = Arc::new(event_loop.create_window(window_attrs)?);

    // Backends::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        flags: wgpu::InstanceFlags::empty(),
        backend_options: wgpu::BackendOptions::from_env_or_default(),
    });

    let surface = instance.create_surface(window.clone())?;

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: Some(&surface),
        force_fallback_adapter: false,
    }))?;
    info!("Using adapter {:?}", adapter.get_info());

    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::default(),
        label: None,
        memory_hints: wgpu::MemoryHints::MemoryUsage,
        trace: wgpu::Trace::Off,
    }))?;

    let size = window.inner_size();
    let surface_caps = surface.get_capabilities(&adapter);
    let surface_format = surface_caps
        .formats
        .iter()
        .find(|f| f.is_srgb())
        .or_else(|| surface_caps.formats.first())
        .copied()
        .ok_or(InitError::UnsupportedSurface)?;
    let alpha_mode = surface_caps
        .alpha_modes
        .first()
        .copied()
        .ok_or(InitError::UnsupportedSurface)?;

    let present_mode = if window_config.vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    };

    let surface_config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: surface_format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode,
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };

    Ok(Graphics {
        window,
        surface,
        surface_config,
        device,
        queue,
    })
}
