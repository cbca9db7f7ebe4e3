//! # Voxel Task System
//!
//! Background work on voxel data. Tasks here run on the
//! [`TaskManager`](crate::engine_state::task_management::TaskManager) workers.

pub mod chunk_generation_task;
