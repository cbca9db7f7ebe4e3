//! # Camera State Management
//!
//! This module handles all camera-related functionality including:
//! - Camera position and orientation tracking
//! - View and projection matrix calculations
//! - Player input processing for camera control
//! - Finding the block under the crosshair
//!
//! ## Core Components
//! - `Camera`: Represents the camera's position and orientation in 3D space
//! - `CameraController`: Handles player input and updates camera state
//! - `Projection`: Manages the camera's projection matrix
//! - `CameraUniform`: GPU representation of camera data for shaders
//! - [`raycast`]: voxel traversal used for block placement and removal

use cgmath::{Deg, Matrix4, Point3};
use web_time::Duration;

use camera::{Camera, CameraController, CameraUniform, Projection};
use raycast::RaycastHit;

use super::{
    voxels::{coordinates::chunk_at_position, world::World},
    PlayerAction,
};
use crate::config::{CameraConfig, RenderConfig};

pub mod camera;
pub mod raycast;

pub struct CameraState {
    pub camera: Camera,
    pub projection: Projection,
    pub camera_uniform: CameraUniform,
    pub camera_controller: CameraController,
    reach: f32,
}

impl CameraState {
    /// Places the camera at `spawn`, looking along +X and slightly down.
    pub fn new(
        camera_config: &CameraConfig,
        render_config: &RenderConfig,
        width: u32,
        height: u32,
        spawn: Point3<f32>,
    ) -> Self {
        let camera = Camera::new(spawn, Deg(0.0), Deg(-20.0));
        let projection = Projection::new(
            width,
            height,
            Deg(render_config.fov_degrees),
            render_config.z_near,
            render_config.z_far,
        );
        let camera_controller =
            CameraController::new(camera_config.speed, camera_config.sensitivity);

        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj_and_pos(&camera, &projection);

        CameraState {
            camera,
            projection,
            camera_uniform,
            camera_controller,
            reach: camera_config.reach,
        }
    }

    pub fn intake_actions(&mut self, actions: &PlayerAction) {
        self.camera_controller.intake_actions(actions);
    }

    /// Applies the frame's input and refreshes the uniform.
    pub fn update(&mut self, dt: Duration) -> &CameraUniform {
        self.camera
            .get_controller_updates_and_reset_controller(&mut self.camera_controller, dt);
        self.camera_uniform
            .update_view_proj_and_pos(&self.camera, &self.projection);
        &self.camera_uniform
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
        self.camera_uniform
            .update_view_proj_and_pos(&self.camera, &self.projection);
    }

    pub fn position(&self) -> Point3<f32> {
        self.camera.position
    }

    pub fn chunk_position(&self) -> Point3<i32> {
        chunk_at_position(self.camera.position)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection.calc_matrix() * self.camera.calc_matrix()
    }

    /// First solid block along the view direction within reach.
    pub fn target(&self, world: &World) -> Option<RaycastHit> {
        raycast::raycast(
            self.camera.position,
            self.camera.get_view_vec(),
            self.reach,
            |block| !world.get_block(block).is_air(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::{block_type::BlockType, Block};
    use crate::engine_state::voxels::block::block_side::BlockSide;

    #[test]
    fn targets_the_block_in_front() {
        let mut state = CameraState::new(
            &CameraConfig::default(),
            &RenderConfig::default(),
            800,
            600,
            Point3::new(0.5, 0.5, 0.5),
        );
        state.camera.pitch = cgmath::Rad(0.0);

        let mut world = World::new();
        world.set_block(Point3::new(4, 0, 0), Block::new(BlockType::STONE));

        let hit = state.target(&world).unwrap();
        assert_eq!(hit.block, Point3::new(4, 0, 0));
        assert_eq!(hit.face, Some(BlockSide::FRONT));
    }

    #[test]
    fn nothing_targeted_in_empty_world() {
        let state = CameraState::new(
            &CameraConfig::default(),
            &RenderConfig::default(),
            800,
            600,
            Point3::new(0.5, 40.0, 0.5),
        );
        assert!(state.target(&World::new()).is_none());
    }
}
