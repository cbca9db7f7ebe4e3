//! # Voxel World
//!
//! A chunk-based voxel world client built with Rust and WGPU.
//!
//! ## Key Modules
//!
//! * `application_state` - Window, input, frame pacing and the engine lifecycle
//! * `config` - Runtime settings read from `config.json`
//! * `core` - Shared-ownership primitives
//! * `engine_state` - World storage, chunk streaming, meshing and rendering
//! * `error` - Error types for each failure class
//!
//! ## Architecture
//!
//! The frame loop runs on the main thread and owns the [`World`]. Terrain
//! generation and chunk loading run on worker threads and hand finished
//! block data back through channels; all structural changes to the world and
//! all GPU work happen on the main thread.
//!
//! ## Usage
//!
//! ```no_run
//! fn main() -> std::process::ExitCode {
//!     voxel_world::run()
//! }
//! ```
//!
//! [`World`]: engine_state::voxels::world::World

use std::process::ExitCode;

use log::{error, info, LevelFilter};
use winit::event_loop::EventLoop;

use application_state::ApplicationState;
use config::EngineConfig;
use error::InitError;

mod application_state;
pub mod config;
pub mod core;
pub mod engine_state;
pub mod error;

/// Initializes logging, loads the configuration and runs the event loop
/// until the window closes.
///
/// Returns a failure status when the window or graphics context could not be
/// created.
pub fn run() -> ExitCode {
    env_logger::Builder::new()
        .target(env_logger::Target::Stdout)
        .filter_level(LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();
    info!("Logger initialized");

    let config = EngineConfig::load();

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            error!("{}", InitError::from(e));
            return ExitCode::FAILURE;
        }
    };

    let mut state = ApplicationState::new(config);
    if let Err(e) = event_loop.run_app(&mut state) {
        error!("Event loop failed: {e}");
        return ExitCode::FAILURE;
    }

    info!("Exited in state {:?}", state.lifecycle());
    state.exit_code()
}
