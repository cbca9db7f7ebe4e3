//! # Voxel World
//!
//! This module contains the voxel data model and everything that produces or
//! stores block data.
//!
//! ## Architecture
//!
//! * **Block**: Block ids, their static properties and per-block metadata
//! * **Chunk**: Fixed-size 16x16x16 arrays of blocks with dirty and version tracking
//! * **World**: The map from chunk coordinate to chunk, and the remesh queue
//! * **Biome**: Per-column climate that shapes terrain and tints foliage
//! * **Generation**: Seeded terrain noise
//! * **Lighting**: Sky light flood fill, rebuilt before each remesh
//! * **Persistence**: Chunk files, world metadata and the unload stash
//! * **Tasks**: Chunk generation jobs run on worker threads
//!
//! ## Data Flow
//!
//! 1. The chunk manager asks for a chunk by publishing a generation task
//! 2. The task reads the chunk from storage or generates it
//! 3. The result is inserted into the world on the main thread
//! 4. Insertions and edits mark chunks dirty; dirty chunks get relit and remeshed

pub mod biome;
pub mod block;
pub mod chunk;
pub mod coordinates;
pub mod generation;
pub mod lighting;
pub mod persistence;
pub mod tasks;
pub mod world;
