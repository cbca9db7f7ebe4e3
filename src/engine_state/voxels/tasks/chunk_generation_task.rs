//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which produces the block data
//! of one chunk on a worker thread. A chunk that was edited and written to
//! disk earlier is read back from the [`ChunkStore`]; any other chunk is
//! generated from the world seed. Stashed chunks never reach a task: the
//! chunk manager restores them before scheduling.
//!
//! The task never touches the [`World`](crate::engine_state::voxels::world::World).
//! It returns a [`GeneratedChunk`] that the chunk manager applies on the main
//! thread.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::core::MtResource;
use crate::engine_state::task_management::task::Task;
use crate::engine_state::voxels::chunk::Chunk;
use crate::engine_state::voxels::coordinates::ChunkCoordinate;
use crate::engine_state::voxels::generation::TerrainGenerator;
use crate::engine_state::voxels::persistence::ChunkStore;
use crate::error::GenerationError;

/// A request to produce the chunk at `coordinate`.
pub struct ChunkGenerationTask {
    /// The position of the chunk to generate (in chunk coordinates)
    pub coordinate: ChunkCoordinate,
    /// Identifies this request. A result whose ticket is no longer pending is stale.
    pub ticket: u64,
    generator: Arc<TerrainGenerator>,
    store: Option<MtResource<ChunkStore>>,
}

/// The outcome of a [`ChunkGenerationTask`].
pub struct GeneratedChunk {
    pub coordinate: ChunkCoordinate,
    pub ticket: u64,
    pub outcome: Result<Chunk, GenerationError>,
}

impl ChunkGenerationTask {
    pub fn new(
        coordinate: ChunkCoordinate,
        ticket: u64,
        generator: Arc<TerrainGenerator>,
        store: Option<MtResource<ChunkStore>>,
    ) -> Self {
        ChunkGenerationTask {
            coordinate,
            ticket,
            generator,
            store,
        }
    }

    fn produce(&self) -> Result<Chunk, GenerationError> {
        if let Some(store) = &self.store {
            let saved = store
                .get()
                .read(self.coordinate)
                .map_err(|source| GenerationError::Storage {
                    coordinate: self.coordinate,
                    source,
                })?;
            if let Some(chunk) = saved {
                return Ok(chunk);
            }
        }
        Ok(self.generator.generate(self.coordinate))
    }
}

impl Task for ChunkGenerationTask {
    type Output = GeneratedChunk;

    /// Produces the chunk. A panic inside generation is caught and reported
    /// as [`GenerationError::Panicked`] so the worker survives.
    fn process(self: Box<Self>) -> GeneratedChunk {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.produce()))
            .unwrap_or(Err(GenerationError::Panicked(self.coordinate)));

        GeneratedChunk {
            coordinate: self.coordinate,
            ticket: self.ticket,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::engine_state::voxels::block::{block_type::BlockType, Block};

    #[test]
    fn unsaved_chunks_are_generated_from_the_seed() {
        let generator = Arc::new(TerrainGenerator::new(5));
        let coordinate = Point3::new(0, 0, 0);
        let task = Box::new(ChunkGenerationTask::new(coordinate, 1, generator.clone(), None));

        let result = task.process();
        assert_eq!(result.ticket, 1);
        let chunk = result.outcome.unwrap();
        assert_eq!(chunk.blocks(), generator.generate(coordinate).blocks());
    }

    #[test]
    fn saved_chunks_are_read_back_without_removing_them() {
        let dir = tempfile::tempdir().unwrap();
        let store = MtResource::new(ChunkStore::open(dir.path(), 4, true).unwrap());
        let coordinate = Point3::new(3, -2, 1);

        let mut chunk = Chunk::empty(coordinate);
        chunk.set_block(Point3::new(1, 2, 3), Block::new(BlockType::LEAVES));
        store.get().save(&chunk).unwrap();

        let task = Box::new(ChunkGenerationTask::new(
            coordinate,
            2,
            Arc::new(TerrainGenerator::new(5)),
            Some(store.clone()),
        ));
        let chunk = task.process().outcome.unwrap();
        assert_eq!(
            chunk.get_block(Point3::new(1, 2, 3)),
            Block::new(BlockType::LEAVES)
        );
        assert!(chunk.is_edited());
        assert!(store.get().contains(coordinate));
    }

    #[test]
    fn stashed_chunks_are_left_in_the_stash() {
        let dir = tempfile::tempdir().unwrap();
        let store = MtResource::new(ChunkStore::open(dir.path(), 4, true).unwrap());
        let coordinate = Point3::new(0, 0, 0);

        let mut chunk = Chunk::empty(coordinate);
        chunk.set_block(Point3::new(1, 2, 3), Block::new(BlockType::LEAVES));
        store.get_mut().stash(chunk).unwrap();

        let generator = Arc::new(TerrainGenerator::new(5));
        let task = Box::new(ChunkGenerationTask::new(
            coordinate,
            4,
            generator.clone(),
            Some(store.clone()),
        ));
        let produced = task.process().outcome.unwrap();
        assert_eq!(produced.blocks(), generator.generate(coordinate).blocks());
        assert_eq!(store.get().stashed_count(), 1);
    }

    #[test]
    fn corrupt_files_fail_generation() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::open(dir.path(), 4, true).unwrap();
        let coordinate = Point3::new(0, 0, 0);
        std::fs::create_dir_all(store.region_path(coordinate)).unwrap();
        std::fs::write(store.chunk_path(coordinate), b"not a chunk").unwrap();

        let task = Box::new(ChunkGenerationTask::new(
            coordinate,
            3,
            Arc::new(TerrainGenerator::new(5)),
            Some(MtResource::new(store)),
        ));
        assert!(matches!(
            task.process().outcome,
            Err(GenerationError::Storage { .. })
        ));
    }
}
