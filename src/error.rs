//! # Engine Errors
//!
//! Error types for every failure class the engine distinguishes. Only
//! [`InitError`] ends the process; everything else is logged and the frame
//! loop carries on with a fallback.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine_state::voxels::coordinates::{BlockCoordinate, ChunkCoordinate};

/// Failure to bring up the window or graphics context. Fatal.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible graphics adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to open graphics device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface does not support the selected adapter")]
    UnsupportedSurface,

    #[error("failed to compile the built-in chunk shader: {0}")]
    BuiltinShader(String),
}

/// A shader or texture could not be loaded. The renderer falls back to a
/// built-in replacement.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode texture atlas: {0}")]
    Image(#[from] image::ImageError),

    #[error("texture atlas is {width}x{height}, expected a multiple of {columns}x{rows} tiles")]
    AtlasLayout {
        width: u32,
        height: u32,
        columns: u32,
        rows: u32,
    },

    #[error("shader rejected by the device: {0}")]
    Shader(String),
}

/// Chunk file or world metadata could not be read or written.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("chunk storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("world metadata is malformed: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("chunk file has bad magic bytes")]
    BadMagic,

    #[error("chunk file format version {found} is not supported (expected {expected})")]
    UnsupportedVersion { expected: u16, found: u16 },

    #[error("chunk file is for {found:?} but was requested as {expected:?}")]
    CoordinateMismatch {
        expected: ChunkCoordinate,
        found: ChunkCoordinate,
    },

    #[error("chunk file is corrupt: {0}")]
    Corrupt(&'static str),
}

/// A chunk could not be produced. The chunk stays air until it re-enters the
/// load radius.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("failed to load chunk {coordinate:?} from disk: {source}")]
    Storage {
        coordinate: ChunkCoordinate,
        #[source]
        source: StorageError,
    },

    #[error("generation of chunk {0:?} panicked")]
    Panicked(ChunkCoordinate),
}

/// A block edit was refused. Nothing was written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditRejected {
    #[error("block {block:?} lies in chunk {chunk:?} which is not loaded")]
    ChunkNotLoaded {
        block: BlockCoordinate,
        chunk: ChunkCoordinate,
    },
}

/// The configuration file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A frame could not be rendered.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("surface ran out of memory")]
    OutOfMemory,

    #[error("surface error: {0}")]
    Surface(wgpu::SurfaceError),
}
