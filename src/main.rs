//! # Voxel World Application Entry Point
//!
//! Calls into the library's `run()` function to start the engine.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release
//! ```

use std::process::ExitCode;

fn main() -> ExitCode {
    voxel_world::run()
}
