//! # Chunk Manager
//!
//! Keeps the cube of chunks around the camera loaded and meshed. Called once
//! per frame from the game loop.
//!
//! ## Frame Update
//!
//! 1. Chunks outside the load radius are unloaded: their GPU mesh is released,
//!    they leave the [`World`], and edited ones go to the [`ChunkStore`].
//! 2. Generation requests that left the radius are abandoned.
//! 3. Every missing coordinate in range is filled, nearest first. A chunk
//!    waiting in the store's stash goes straight back into the world; any
//!    other coordinate gets a generation request.
//! 4. Finished generation results are applied. Each request carries a ticket;
//!    a result whose ticket is no longer pending is stale and discarded.
//!    Discarding loses nothing, since workers only read chunk files and
//!    never take chunks out of the stash.
//! 5. Up to `remesh_budget` dirty chunks are rebuilt, oldest first. Each is
//!    relit first. When its bottom layer of light changes, the chunk below is
//!    marked dirty so sunlight works its way down over the following frames.
//!
//! A chunk whose upper neighbour is not loaded counts as open sky when that
//! neighbour lies above the highest terrain, and as covered otherwise.
//!
//! A coordinate whose generation failed stays air until it leaves the radius
//! and comes back, at which point it is requested again.

use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use cgmath::Point3;
use log::{debug, error, info, warn};

use super::rendering::chunk_buffers::MeshResidency;
use super::rendering::meshing::build_mesh;
use super::voxels::block::block_side::BlockSide;
use super::task_management::TaskManager;
use super::voxels::chunk::Chunk;
use super::voxels::coordinates::{
    chunk_at_position, chunk_distance, chunk_distance_squared, chunk_origin, ChunkCoordinate,
};
use super::voxels::generation::TerrainGenerator;
use super::voxels::lighting::{sky_light, SkyAbove};
use super::voxels::persistence::ChunkStore;
use super::voxels::tasks::chunk_generation_task::{ChunkGenerationTask, GeneratedChunk};
use super::voxels::world::World;
use crate::core::MtResource;

/// Counters describing chunk streaming, logged on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkDiagnostics {
    pub loaded: usize,
    pub pending: usize,
    pub queued: usize,
    pub in_flight: usize,
    pub failed: usize,
    pub dirty: usize,
    pub stashed: usize,
}

/// What one [`ChunkManager::update`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub unloaded: usize,
    pub abandoned: usize,
    pub scheduled: usize,
    pub restored: usize,
    pub inserted: usize,
    pub discarded: usize,
    pub failed: usize,
    pub remeshed: usize,
}

/// Streams chunks in and out around the camera.
pub struct ChunkManager {
    load_radius: i32,
    remesh_budget: usize,
    generator: Arc<TerrainGenerator>,
    store: MtResource<ChunkStore>,
    tasks: TaskManager<ChunkGenerationTask>,
    /// Outstanding requests by coordinate, holding the ticket of the live request.
    pending: HashMap<ChunkCoordinate, u64>,
    failed: HashSet<ChunkCoordinate>,
    next_ticket: u64,
    next_mesh_version: u64,
    center: Option<ChunkCoordinate>,
}

impl ChunkManager {
    pub fn new(
        load_radius: i32,
        remesh_budget: usize,
        workers: usize,
        generator: TerrainGenerator,
        store: ChunkStore,
    ) -> Self {
        info!(
            "Chunk manager: load radius {load_radius}, remesh budget {remesh_budget}, seed {}",
            generator.seed()
        );
        ChunkManager {
            load_radius,
            remesh_budget: remesh_budget.max(1),
            generator: Arc::new(generator),
            store: MtResource::new(store),
            tasks: TaskManager::new(workers),
            pending: HashMap::new(),
            failed: HashSet::new(),
            next_ticket: 1,
            next_mesh_version: 1,
            center: None,
        }
    }

    pub fn load_radius(&self) -> i32 {
        self.load_radius
    }

    /// Chunk the camera was in at the last update.
    pub fn center(&self) -> Option<ChunkCoordinate> {
        self.center
    }

    fn in_range(&self, center: ChunkCoordinate, coordinate: ChunkCoordinate) -> bool {
        chunk_distance(center, coordinate) <= self.load_radius
    }

    /// Every coordinate within the load radius of `center`, nearest first.
    pub fn coordinates_in_range(&self, center: ChunkCoordinate) -> Vec<ChunkCoordinate> {
        let r = self.load_radius;
        let side = (2 * r + 1) as usize;
        let mut coordinates = Vec::with_capacity(side * side * side);
        for x in -r..=r {
            for y in -r..=r {
                for z in -r..=r {
                    coordinates.push(Point3::new(center.x + x, center.y + y, center.z + z));
                }
            }
        }
        coordinates.sort_by_key(|coordinate| chunk_distance_squared(center, *coordinate));
        coordinates
    }

    /// Runs one frame of chunk streaming around `camera_position`.
    pub fn update<R: MeshResidency>(
        &mut self,
        camera_position: Point3<f32>,
        world: &mut World,
        residency: &mut R,
    ) -> UpdateReport {
        let center = chunk_at_position(camera_position);
        if self.center != Some(center) {
            debug!("Camera entered chunk {center:?}");
            self.center = Some(center);
        }

        let mut report = UpdateReport {
            unloaded: self.unload_out_of_range(center, world, residency),
            abandoned: self.abandon_out_of_range(center),
            ..UpdateReport::default()
        };
        (report.restored, report.scheduled) = self.schedule(center, world);

        self.tasks.process_queued_tasks();
        let results = self.tasks.drain_completed();
        self.apply_results(results, world, &mut report);

        report.remeshed = self.remesh_dirty(world);

        if report.unloaded > 0 || report.inserted > 0 || report.restored > 0 {
            debug!(
                "Chunks: {} loaded, {} restored, {} unloaded, {} pending",
                report.inserted,
                report.restored,
                report.unloaded,
                self.pending.len()
            );
        }
        report
    }

    fn unload_out_of_range<R: MeshResidency>(
        &mut self,
        center: ChunkCoordinate,
        world: &mut World,
        residency: &mut R,
    ) -> usize {
        let outside: Vec<ChunkCoordinate> = world
            .loaded_coordinates()
            .filter(|coordinate| !self.in_range(center, *coordinate))
            .collect();

        for coordinate in &outside {
            residency.release(*coordinate);
            if let Some(chunk) = world.remove_chunk(*coordinate) {
                self.stash_if_edited(chunk);
            }
        }

        let radius = self.load_radius;
        self.failed
            .retain(|coordinate| chunk_distance(center, *coordinate) <= radius);

        outside.len()
    }

    fn abandon_out_of_range(&mut self, center: ChunkCoordinate) -> usize {
        let before = self.pending.len();
        let radius = self.load_radius;
        self.pending
            .retain(|coordinate, _| chunk_distance(center, *coordinate) <= radius);

        let pending = &self.pending;
        self.tasks
            .retain_queued(|task| pending.get(&task.coordinate) == Some(&task.ticket));

        before - self.pending.len()
    }

    /// Returns how many chunks came back from the stash and how many
    /// generation requests were published.
    fn schedule(&mut self, center: ChunkCoordinate, world: &mut World) -> (usize, usize) {
        let missing: Vec<ChunkCoordinate> = self
            .coordinates_in_range(center)
            .into_iter()
            .filter(|coordinate| {
                !world.is_loaded(*coordinate)
                    && !self.pending.contains_key(coordinate)
                    && !self.failed.contains(coordinate)
            })
            .collect();

        let mut restored = 0;
        let mut scheduled = 0;
        for coordinate in &missing {
            let stashed = self.store.get_mut().unstash(*coordinate);
            if let Some(chunk) = stashed {
                world.insert_chunk(chunk);
                restored += 1;
                continue;
            }

            let ticket = self.next_ticket;
            self.next_ticket += 1;
            self.pending.insert(*coordinate, ticket);
            self.tasks.publish_task(Box::new(ChunkGenerationTask::new(
                *coordinate,
                ticket,
                self.generator.clone(),
                Some(self.store.clone()),
            )));
            scheduled += 1;
        }
        (restored, scheduled)
    }

    fn apply_results(
        &mut self,
        results: Vec<GeneratedChunk>,
        world: &mut World,
        report: &mut UpdateReport,
    ) {
        for result in results {
            if self.pending.get(&result.coordinate) != Some(&result.ticket) {
                report.discarded += 1;
                continue;
            }
            self.pending.remove(&result.coordinate);
            if world.is_loaded(result.coordinate) {
                report.discarded += 1;
                continue;
            }

            match result.outcome {
                Ok(chunk) => {
                    world.insert_chunk(chunk);
                    report.inserted += 1;
                }
                Err(e) => {
                    warn!("{e}; chunk {:?} stays empty", result.coordinate);
                    self.failed.insert(result.coordinate);
                    report.failed += 1;
                }
            }
        }
    }

    fn stash_if_edited(&self, chunk: Chunk) {
        if !chunk.is_edited() {
            return;
        }
        let coordinate = chunk.position;
        if let Err(e) = self.store.get_mut().stash(chunk) {
            error!("Failed to save chunk {coordinate:?}: {e}");
        }
    }

    /// Recomputes the sky light of a loaded chunk. Marks the chunk below dirty
    /// when the light leaving through the bottom face changed.
    fn relight(&self, world: &mut World, coordinate: ChunkCoordinate) {
        let Some(chunk) = world.get_chunk(coordinate) else {
            return;
        };
        let above = coordinate + BlockSide::TOP.offset();
        let sky = match world.get_chunk(above).and_then(|chunk| chunk.light()) {
            Some(light) => SkyAbove::Chunk(light),
            None if chunk_origin(above).y > TerrainGenerator::max_height() => SkyAbove::Open,
            None => SkyAbove::Covered,
        };
        let light = sky_light(chunk, sky);

        let Some(chunk) = world.get_chunk_mut(coordinate) else {
            return;
        };
        let changed = chunk
            .set_light(light.clone())
            .map_or(true, |previous| !previous.bottom_layer_matches(&light));
        if changed {
            world.mark_dirty(coordinate + BlockSide::BOTTOM.offset());
        }
    }

    /// Relights and rebuilds the meshes of up to `remesh_budget` dirty chunks,
    /// oldest first. Returns the number rebuilt.
    pub fn remesh_dirty(&mut self, world: &mut World) -> usize {
        let mut remeshed = 0;
        for coordinate in world.take_dirty(self.remesh_budget) {
            self.relight(world, coordinate);
            let Some(chunk) = world.get_chunk(coordinate) else {
                continue;
            };
            let neighbours = world.neighbours(coordinate);
            let biomes = self.generator.biome_columns(coordinate);
            let built = panic::catch_unwind(AssertUnwindSafe(|| {
                build_mesh(chunk, neighbours, &biomes)
            }));
            let mut mesh = match built {
                Ok(mesh) => mesh,
                Err(_) => {
                    warn!("Meshing chunk {coordinate:?} panicked; keeping its previous mesh");
                    continue;
                }
            };

            if let Some(chunk) = world.get_chunk_mut(coordinate) {
                mesh.version = self.next_mesh_version;
                self.next_mesh_version += 1;
                chunk.set_mesh(mesh);
                remeshed += 1;
            }
        }
        remeshed
    }

    /// Loaded chunks within the radius of the last update that have geometry.
    pub fn visible_chunks(&self, world: &World) -> Vec<ChunkCoordinate> {
        let Some(center) = self.center else {
            return Vec::new();
        };
        world
            .chunks()
            .filter(|chunk| self.in_range(center, chunk.position))
            .filter(|chunk| chunk.mesh().is_some_and(|mesh| !mesh.is_empty()))
            .map(|chunk| chunk.position)
            .collect()
    }

    pub fn diagnostics(&self, world: &World) -> ChunkDiagnostics {
        ChunkDiagnostics {
            loaded: world.chunk_count(),
            pending: self.pending.len(),
            queued: self.tasks.queued_count(),
            in_flight: self.tasks.in_flight_count(),
            failed: self.failed.len(),
            dirty: world.dirty_count(),
            stashed: self.store.get().stashed_count(),
        }
    }

    /// Unloads everything and writes edited chunks to disk.
    ///
    /// Outstanding generation is abandoned and worker threads are not waited
    /// on. Their results only ever hold data that is still on disk or freshly
    /// generated, so dropping them loses no edits. Returns the number of chunk
    /// files written.
    pub fn shutdown<R: MeshResidency>(&mut self, world: &mut World, residency: &mut R) -> usize {
        self.pending.clear();
        self.tasks.retain_queued(|_| false);

        let mut store = self.store.get_mut();
        let mut written = 0;
        for chunk in world.drain() {
            residency.release(chunk.position);
            if !chunk.is_edited() {
                continue;
            }
            match store.save(&chunk) {
                Ok(()) => written += 1,
                Err(e) => error!("Failed to save chunk {:?}: {e}", chunk.position),
            }
        }
        written += store.flush();
        info!("Saved {written} edited chunk(s) to {}", store.root().display());
        written
    }
}
