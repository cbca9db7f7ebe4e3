//! # Engine State Module
//!
//! The core engine module that owns the world and every subsystem acting on it.
//!
//! ## Key Components
//!
//! * `EngineState` - The main state container for the engine
//! * `camera_state` - Handles camera positioning, movement and block targeting
//! * `chunk_manager` - Streams chunks in and out around the camera
//! * `rendering` - Meshing, GPU residency and the render pass
//! * `task_management` - Worker threads for chunk generation
//! * `voxels` - Blocks, chunks, the world map, terrain and persistence
//!
//! ## Frame
//!
//! One call to [`EngineState::frame`] runs, in order: input → camera and
//! block edits → chunk streaming and remeshing → render and present.

use cgmath::Point3;
use log::{info, warn};
use web_time::Duration;
use wgpu::{Device, Queue, Surface, SurfaceConfiguration};
use winit::{dpi::PhysicalSize, event::MouseButton, keyboard::KeyCode};

use camera_state::{raycast::RaycastHit, CameraState};
use chunk_manager::ChunkManager;
use rendering::{FrameStats, RenderPipeline};
use voxels::{
    block::{block_type::BlockType, Block},
    coordinates::BlockCoordinate,
    generation::TerrainGenerator,
    persistence::ChunkStore,
    world::World,
};

use crate::{
    application_state::input_state::ProcessedInputState,
    config::EngineConfig,
    error::{EditRejected, InitError, RenderError},
};

pub mod camera_state;
pub mod chunk_manager;
pub mod rendering;
pub mod task_management;
pub mod voxels;

const HOTBAR_KEYS: [KeyCode; 5] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
];

/// Blocks above the terrain surface at which the camera spawns.
const SPAWN_CLEARANCE: i32 = 3;

/// What the player asked for this frame, decoupled from concrete keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerAction {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,
    /// Summed relative mouse motion, only while the cursor is captured.
    pub rotate_view: Option<(f64, f64)>,
    pub remove_block: bool,
    pub place_block: bool,
    /// Hotbar slot chosen this frame.
    pub select_slot: Option<usize>,
    pub show_diagnostics: bool,
}

impl PlayerAction {
    /// Translates one frame of processed input.
    ///
    /// Mouse look and block edits only apply while the cursor is captured.
    pub fn from_input(input: &ProcessedInputState, cursor_captured: bool) -> Self {
        let held = |key| input.get_key_state(key).is_active();
        let clicked =
            |button| cursor_captured && input.get_mouse_button_state(button).is_just_pressed();

        PlayerAction {
            move_forward: held(KeyCode::KeyW),
            move_backward: held(KeyCode::KeyS),
            move_left: held(KeyCode::KeyA),
            move_right: held(KeyCode::KeyD),
            move_up: held(KeyCode::Space),
            move_down: held(KeyCode::ShiftLeft),
            rotate_view: input.get_mouse_delta().filter(|_| cursor_captured),
            remove_block: clicked(MouseButton::Left),
            place_block: clicked(MouseButton::Right),
            select_slot: HOTBAR_KEYS
                .iter()
                .position(|key| input.get_key_state(*key).is_just_pressed()),
            show_diagnostics: input.get_key_state(KeyCode::F3).is_just_pressed(),
        }
    }
}

/// Resolves this frame's block intents against the targeted block.
///
/// Remove clears the hit block. Place fills the cell in front of the hit face
/// with `selected`, oriented along that face's axis. Remove wins when both
/// are requested. Returns the edited block, if any.
pub fn apply_block_edit(
    world: &mut World,
    hit: Option<RaycastHit>,
    action: &PlayerAction,
    selected: BlockType,
) -> Result<Option<BlockCoordinate>, EditRejected> {
    let Some(hit) = hit else {
        return Ok(None);
    };

    if action.remove_block {
        world.try_set_block(hit.block, Block::AIR)?;
        return Ok(Some(hit.block));
    }

    if action.place_block {
        let (Some(target), Some(face)) = (hit.adjacent(), hit.face) else {
            return Ok(None);
        };
        world.try_set_block(target, Block::new(selected).with_axis(face.axis()))?;
        return Ok(Some(target));
    }

    Ok(None)
}

/// The main state container for the voxel engine.
///
/// Owns the [`World`] and coordinates the camera, chunk streaming and
/// rendering around it. Everything here runs on the main thread.
pub struct EngineState {
    pub world: World,
    pub chunk_manager: ChunkManager,
    pub camera_state: CameraState,
    pub render_pipeline: RenderPipeline,
    pub player_actions: PlayerAction,
    hotbar_slot: usize,
}

impl EngineState {
    /// Sets up the world, chunk streaming and the render pipeline.
    ///
    /// Storage problems are not fatal: the world then runs without saving.
    ///
    /// # Errors
    /// Returns [`InitError`] if the render pipeline cannot be built.
    pub fn new(
        surface: Surface<'static>,
        surface_config: SurfaceConfiguration,
        device: Device,
        queue: Queue,
        config: &EngineConfig,
    ) -> Result<Self, InitError> {
        let (width, height) = (surface_config.width, surface_config.height);
        let render_pipeline =
            RenderPipeline::new(surface, surface_config, device, queue, &config.render)?;

        let (store, seed) = open_store(config);
        let generator = TerrainGenerator::new(seed);
        let spawn = Point3::new(
            8.5,
            (generator.surface_height(8, 8) + SPAWN_CLEARANCE) as f32,
            8.5,
        );
        info!("World seed {seed}, spawning at {spawn:?}");

        let chunk_manager = ChunkManager::new(
            config.render.load_radius,
            config.render.remesh_budget,
            config.workers,
            generator,
            store,
        );
        let camera_state =
            CameraState::new(&config.camera, &config.render, width, height, spawn);

        Ok(Self {
            world: World::new(),
            chunk_manager,
            camera_state,
            render_pipeline,
            player_actions: PlayerAction::default(),
            hotbar_slot: 0,
        })
    }

    /// Block type placed by a right click.
    pub fn selected_block(&self) -> BlockType {
        BlockType::placeable()[self.hotbar_slot]
    }

    /// Records this frame's input.
    pub fn set_input_commands(&mut self, input: &ProcessedInputState, cursor_captured: bool) {
        self.player_actions = PlayerAction::from_input(input, cursor_captured);

        if let Some(slot) = self.player_actions.select_slot {
            self.hotbar_slot = slot;
            info!("Selected {:?}", self.selected_block());
        }
    }

    /// Runs one frame: camera, block edits, chunk streaming, then rendering.
    ///
    /// # Errors
    /// Surface failures the renderer could not recover from.
    pub fn frame(&mut self, dt: Duration) -> Result<FrameStats, RenderError> {
        let actions = std::mem::take(&mut self.player_actions);

        self.camera_state.intake_actions(&actions);
        self.camera_state.update(dt);

        let hit = self.camera_state.target(&self.world);
        let selected = self.selected_block();
        if let Err(e) = apply_block_edit(&mut self.world, hit, &actions, selected) {
            warn!("Edit rejected: {e}");
        }

        self.chunk_manager.update(
            self.camera_state.position(),
            &mut self.world,
            self.render_pipeline.chunk_buffers_mut(),
        );

        if actions.show_diagnostics {
            self.log_diagnostics();
        }

        let visible = self.chunk_manager.visible_chunks(&self.world);
        self.render_pipeline
            .render_frame(&self.camera_state, &self.world, &visible)
    }

    pub fn log_diagnostics(&self) {
        let chunks = self.chunk_manager.diagnostics(&self.world);
        let buffers = self.render_pipeline.chunk_buffers();
        info!(
            "Camera at {:?} in chunk {:?}; chunks loaded {} pending {} (queued {}, in flight {}) \
             failed {} dirty {} stashed {}; GPU meshes {} using {} bytes, {} uploads",
            self.camera_state.position(),
            self.camera_state.chunk_position(),
            chunks.loaded,
            chunks.pending,
            chunks.queued,
            chunks.in_flight,
            chunks.failed,
            chunks.dirty,
            chunks.stashed,
            buffers.resident_count(),
            buffers.bytes_resident(),
            buffers.upload_count(),
        );
    }

    pub fn resize_surface(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.render_pipeline.resize(size.width, size.height);
        self.camera_state.resize(size.width, size.height);
    }

    /// Saves edited chunks and releases every GPU mesh.
    pub fn shutdown(&mut self) {
        self.chunk_manager
            .shutdown(&mut self.world, self.render_pipeline.chunk_buffers_mut());
        self.render_pipeline.chunk_buffers_mut().release_all();
    }
}

/// Opens the chunk store and settles the seed, falling back to an unsaved
/// world when the save directory is unusable.
fn open_store(config: &EngineConfig) -> (ChunkStore, u32) {
    let world = &config.world;
    let opened = ChunkStore::open(&world.save_directory, world.stash_capacity, world.persist)
        .and_then(|store| {
            let metadata = store.load_or_create_metadata(world.seed)?;
            Ok((store, metadata.seed))
        });

    match opened {
        Ok(opened) => opened,
        Err(e) => {
            warn!(
                "Cannot use save directory {}: {e}; edits will not be saved",
                world.save_directory.display()
            );
            let seed = world.seed.unwrap_or_else(|| fastrand::u32(..));
            (
                ChunkStore::unsaved(&world.save_directory, world.stash_capacity),
                seed,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_state::input_state::RawInputState;
    use crate::engine_state::voxels::block::block_side::{Axis, BlockSide};
    use crate::engine_state::voxels::chunk::Chunk;

    fn input(
        keys: &[(KeyCode, RawInputState)],
        buttons: &[(MouseButton, RawInputState)],
    ) -> ProcessedInputState {
        ProcessedInputState {
            keyboard_states: keys.iter().copied().collect(),
            mouse_button_states: buttons.iter().copied().collect(),
            mouse_delta: Some((3.0, -1.0)),
        }
    }

    #[test]
    fn keys_translate_to_actions() {
        let state = input(
            &[
                (KeyCode::KeyW, RawInputState::Held),
                (KeyCode::Space, RawInputState::Pressed),
                (KeyCode::KeyS, RawInputState::Released),
                (KeyCode::Digit3, RawInputState::Pressed),
                (KeyCode::F3, RawInputState::Pressed),
            ],
            &[(MouseButton::Left, RawInputState::Pressed)],
        );
        let action = PlayerAction::from_input(&state, true);

        assert!(action.move_forward);
        assert!(action.move_up);
        assert!(!action.move_backward);
        assert_eq!(action.select_slot, Some(2));
        assert!(action.show_diagnostics);
        assert!(action.remove_block);
        assert!(!action.place_block);
        assert_eq!(action.rotate_view, Some((3.0, -1.0)));
    }

    #[test]
    fn held_click_edits_only_once() {
        let state = input(&[], &[(MouseButton::Right, RawInputState::Held)]);
        assert!(!PlayerAction::from_input(&state, true).place_block);
    }

    #[test]
    fn uncaptured_cursor_neither_looks_nor_edits() {
        let state = input(
            &[(KeyCode::KeyD, RawInputState::Held)],
            &[(MouseButton::Left, RawInputState::Pressed)],
        );
        let action = PlayerAction::from_input(&state, false);
        assert!(action.move_right);
        assert!(!action.remove_block);
        assert_eq!(action.rotate_view, None);
    }

    fn world_with_loaded(chunks: &[Point3<i32>]) -> World {
        let mut world = World::new();
        for chunk in chunks {
            world.insert_chunk(Chunk::empty(*chunk));
        }
        world
    }

    #[test]
    fn remove_clears_the_hit_block() {
        let mut world = world_with_loaded(&[Point3::new(0, 0, 0)]);
        world.set_block(Point3::new(3, 4, 5), Block::new(BlockType::DIRT));
        let hit = RaycastHit {
            block: Point3::new(3, 4, 5),
            face: Some(BlockSide::TOP),
            distance: 2.0,
        };
        let action = PlayerAction {
            remove_block: true,
            ..PlayerAction::default()
        };

        let edited = apply_block_edit(&mut world, Some(hit), &action, BlockType::STONE).unwrap();
        assert_eq!(edited, Some(Point3::new(3, 4, 5)));
        assert!(world.get_block(Point3::new(3, 4, 5)).is_air());
    }

    #[test]
    fn place_fills_the_cell_in_front_of_the_face() {
        let mut world = world_with_loaded(&[Point3::new(0, 0, 0)]);
        let hit = RaycastHit {
            block: Point3::new(3, 4, 5),
            face: Some(BlockSide::LEFT),
            distance: 2.0,
        };
        let action = PlayerAction {
            place_block: true,
            ..PlayerAction::default()
        };

        let edited = apply_block_edit(&mut world, Some(hit), &action, BlockType::LOG).unwrap();
        assert_eq!(edited, Some(Point3::new(3, 4, 4)));
        let placed = world.get_block(Point3::new(3, 4, 4));
        assert_eq!(placed.kind(), Some(BlockType::LOG));
        assert_eq!(placed.axis(), Axis::Z);
    }

    #[test]
    fn place_into_unloaded_chunk_is_rejected() {
        let mut world = world_with_loaded(&[Point3::new(0, 0, 0)]);
        let hit = RaycastHit {
            block: Point3::new(15, 2, 2),
            face: Some(BlockSide::BACK),
            distance: 1.0,
        };
        let action = PlayerAction {
            place_block: true,
            ..PlayerAction::default()
        };

        let result = apply_block_edit(&mut world, Some(hit), &action, BlockType::STONE);
        assert_eq!(
            result,
            Err(EditRejected::ChunkNotLoaded {
                block: Point3::new(16, 2, 2),
                chunk: Point3::new(1, 0, 0),
            })
        );
        assert!(!world.is_loaded(Point3::new(1, 0, 0)));
    }

    #[test]
    fn nothing_happens_without_a_target() {
        let mut world = World::new();
        let action = PlayerAction {
            remove_block: true,
            place_block: true,
            ..PlayerAction::default()
        };
        assert_eq!(
            apply_block_edit(&mut world, None, &action, BlockType::STONE),
            Ok(None)
        );
    }
}
