//! Texture handling for the rendering pipeline.
//!
//! This module provides the depth buffer and the block texture atlas. The
//! atlas is a single RGBA image split into a grid of [`ATLAS_COLUMNS`] by
//! [`ATLAS_ROWS`] square tiles; block faces pick a tile by index, row-major
//! from the top left.
//!
//! When the atlas file is missing or malformed the renderer uses
//! [`placeholder_atlas`], which draws every tile procedurally and marks
//! [`MISSING_TILE`] with a checkerboard.

use std::path::Path;

use image::{Rgba, RgbaImage};
use wgpu::util::DeviceExt;

use crate::engine_state::voxels::block::block_type::MISSING_TILE;
use crate::error::ResourceError;

/// Number of tiles across the atlas.
pub const ATLAS_COLUMNS: u32 = 4;
/// Number of tiles down the atlas.
pub const ATLAS_ROWS: u32 = 4;
/// Edge length in pixels of a tile in the placeholder atlas.
pub const TILE_SIZE: u32 = 16;

/// Represents a GPU texture with associated view and sampler.
pub struct Texture {
    /// The underlying WebGPU texture resource.
    #[allow(dead_code)]
    pub texture: wgpu::Texture,
    /// The texture view used for binding the texture to the pipeline.
    pub view: wgpu::TextureView,
    /// The sampler used for texture filtering and addressing.
    pub sampler: wgpu::Sampler,
}

impl Texture {
    /// The texture format used for depth buffers.
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Creates a new depth texture matching the surface size.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `config` - The surface configuration containing dimensions
    /// * `label` - Debug label for the texture
    pub fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        };

        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Uploads an RGBA atlas image as an sRGB texture with nearest filtering.
    pub fn from_atlas(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        atlas: &RgbaImage,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: atlas.width(),
            height: atlas.height(),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            atlas.as_raw(),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }
}

/// Decodes the atlas at `path` and checks that it splits evenly into tiles.
pub fn load_atlas(path: &Path) -> Result<RgbaImage, ResourceError> {
    let bytes = std::fs::read(path).map_err(|source| ResourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let atlas = image::load_from_memory(&bytes)?.to_rgba8();

    let (width, height) = atlas.dimensions();
    if width == 0
        || height == 0
        || width % ATLAS_COLUMNS != 0
        || height % ATLAS_ROWS != 0
        || width / ATLAS_COLUMNS != height / ATLAS_ROWS
    {
        return Err(ResourceError::AtlasLayout {
            width,
            height,
            columns: ATLAS_COLUMNS,
            rows: ATLAS_ROWS,
        });
    }

    Ok(atlas)
}

/// Loads the atlas at `path`, logging and falling back to
/// [`placeholder_atlas`] on failure.
pub fn load_atlas_or_placeholder(path: &Path) -> RgbaImage {
    match load_atlas(path) {
        Ok(atlas) => {
            log::info!(
                "Loaded texture atlas {} ({}x{})",
                path.display(),
                atlas.width(),
                atlas.height()
            );
            atlas
        }
        Err(e) => {
            log::warn!("{e}; using placeholder atlas");
            placeholder_atlas()
        }
    }
}

/// Draws the built-in atlas. Tiles with no artwork get the missing checkerboard.
pub fn placeholder_atlas() -> RgbaImage {
    let mut atlas = RgbaImage::new(ATLAS_COLUMNS * TILE_SIZE, ATLAS_ROWS * TILE_SIZE);

    for tile in 0..(ATLAS_COLUMNS * ATLAS_ROWS) {
        let tile_x = (tile % ATLAS_COLUMNS) * TILE_SIZE;
        let tile_y = (tile / ATLAS_COLUMNS) * TILE_SIZE;
        for y in 0..TILE_SIZE {
            for x in 0..TILE_SIZE {
                atlas.put_pixel(tile_x + x, tile_y + y, tile_pixel(tile as u16, x, y));
            }
        }
    }

    atlas
}

/// Cheap per-pixel speckle in `0..16`.
fn speckle(x: u32, y: u32, salt: u32) -> u8 {
    let mut h = x.wrapping_mul(374_761_393) ^ y.wrapping_mul(668_265_263) ^ salt;
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    (h >> 28) as u8
}

fn shade(base: [u8; 3], x: u32, y: u32, salt: u32) -> Rgba<u8> {
    let s = speckle(x, y, salt);
    let [r, g, b] = base.map(|c| c.saturating_sub(8).saturating_add(s));
    Rgba([r, g, b, 255])
}

fn tile_pixel(tile: u16, x: u32, y: u32) -> Rgba<u8> {
    const STONE: [u8; 3] = [120, 120, 124];
    const DIRT: [u8; 3] = [121, 85, 58];
    const GRASS: [u8; 3] = [86, 150, 60];
    // Tinted per biome in the shader, so drawn in grey.
    const GRASS_TOP: [u8; 3] = [176, 176, 176];
    const BARK: [u8; 3] = [98, 74, 46];
    const WOOD: [u8; 3] = [168, 136, 88];
    const LEAVES: [u8; 3] = [150, 150, 150];

    match tile {
        0 => shade(STONE, x, y, 1),
        1 => shade(DIRT, x, y, 2),
        2 if y < 4 + (speckle(x, 0, 3) as u32 % 3) => shade(GRASS, x, y, 3),
        2 => shade(DIRT, x, y, 3),
        3 => shade(GRASS_TOP, x, y, 4),
        4 if x % 4 == 0 => shade(BARK.map(|c| c - 24), x, y, 5),
        4 => shade(BARK, x, y, 5),
        5 => {
            let dx = x as i32 * 2 - TILE_SIZE as i32 + 1;
            let dy = y as i32 * 2 - TILE_SIZE as i32 + 1;
            let ring = ((dx * dx + dy * dy) as f32).sqrt() as i32 / 4;
            if ring >= 7 {
                shade(BARK, x, y, 6)
            } else if ring % 2 == 0 {
                shade(WOOD, x, y, 6)
            } else {
                shade(WOOD.map(|c| c - 30), x, y, 6)
            }
        }
        6 => {
            let mut pixel = shade(LEAVES, x, y, 7);
            if speckle(x, y, 8) < 3 {
                pixel.0[3] = 0;
            }
            pixel
        }
        MISSING_TILE => missing_pixel(x, y),
        _ => missing_pixel(x, y),
    }
}

fn missing_pixel(x: u32, y: u32) -> Rgba<u8> {
    let half = TILE_SIZE / 2;
    if (x / half + y / half) % 2 == 0 {
        Rgba([255, 0, 255, 255])
    } else {
        Rgba([0, 0, 0, 255])
    }
}

/// Top-left pixel of `tile` in an atlas with tiles of `tile_size` pixels.
pub fn tile_origin(tile: u16, tile_size: u32) -> (u32, u32) {
    let tile = u32::from(tile) % (ATLAS_COLUMNS * ATLAS_ROWS);
    ((tile % ATLAS_COLUMNS) * tile_size, (tile / ATLAS_COLUMNS) * tile_size)
}

/// Whether `tile` in `atlas` is the missing checkerboard.
pub fn is_missing_tile(atlas: &RgbaImage, tile: u16) -> bool {
    let tile_size = atlas.width() / ATLAS_COLUMNS;
    let (ox, oy) = tile_origin(tile, tile_size);
    let half = tile_size / 2;
    atlas.get_pixel(ox, oy) == &Rgba([255, 0, 255, 255])
        && atlas.get_pixel(ox + half, oy) == &Rgba([0, 0, 0, 255])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_fills_the_whole_grid() {
        let atlas = placeholder_atlas();
        assert_eq!(atlas.width(), ATLAS_COLUMNS * TILE_SIZE);
        assert_eq!(atlas.height(), ATLAS_ROWS * TILE_SIZE);
    }

    #[test]
    fn placeholder_marks_the_missing_tile() {
        let atlas = placeholder_atlas();
        assert!(is_missing_tile(&atlas, MISSING_TILE));
        assert!(!is_missing_tile(&atlas, 0));
        assert!(!is_missing_tile(&atlas, 3));
    }

    #[test]
    fn tinted_tiles_are_grey() {
        let atlas = placeholder_atlas();
        for tile in [3, 6] {
            let (ox, oy) = tile_origin(tile, TILE_SIZE);
            let [r, g, b, _] = atlas.get_pixel(ox + 1, oy + 1).0;
            assert!(r == g && g == b, "tile {tile} is not grey");
        }
    }

    #[test]
    fn leaves_tile_has_transparent_pixels() {
        let atlas = placeholder_atlas();
        let (ox, oy) = tile_origin(6, TILE_SIZE);
        let transparent = (0..TILE_SIZE)
            .flat_map(|y| (0..TILE_SIZE).map(move |x| (x, y)))
            .filter(|&(x, y)| atlas.get_pixel(ox + x, oy + y).0[3] == 0)
            .count();
        assert!(transparent > 0);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_atlas(&dir.path().join("absent.png"));
        assert!(matches!(result, Err(ResourceError::Io { .. })));
    }

    #[test]
    fn garbage_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(matches!(load_atlas(&path), Err(ResourceError::Image(_))));
    }

    #[test]
    fn atlas_must_split_into_square_tiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.png");
        RgbaImage::new(30, 64).save(&path).unwrap();
        assert!(matches!(
            load_atlas(&path),
            Err(ResourceError::AtlasLayout { width: 30, .. })
        ));
    }

    #[test]
    fn saved_placeholder_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.png");
        placeholder_atlas().save(&path).unwrap();

        let atlas = load_atlas(&path).unwrap();
        assert_eq!(atlas, placeholder_atlas());
        assert_eq!(load_atlas_or_placeholder(&dir.path().join("nope.png")), atlas);
    }
}
