//! # Camera Implementation
//!
//! This module contains the core camera implementation including:
//! - Camera representation and transformations
//! - Projection matrix handling
//! - Camera controller for input processing
//! - GPU uniform buffer layout
//!
//! ## Key Components
//! - `Camera`: Represents the camera's position and orientation in 3D space
//! - `Projection`: Manages perspective projection settings
//! - `CameraController`: Turns player actions into movement and rotation
//! - `CameraUniform`: Packed data structure for GPU shaders

use cgmath::*;
use std::f32::consts::FRAC_PI_2;
use web_time::Duration;

use crate::engine_state::PlayerAction;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,  // Scale Z from [-1,1] to [-0.5,0.5]
    0.0, 0.0, 0.5, 1.0,  // Translate Z from [-0.5,0.5] to [0,1]
);

/// Pitch limit, just short of straight up or down.
pub const SAFE_FRAC_PI_2: f32 = FRAC_PI_2 - 0.0001;

/// Radians of rotation per pixel of mouse motion at sensitivity 1.
pub const RADIANS_PER_PIXEL: f32 = 0.01;

/// First-person camera. Yaw zero looks down +X; positive pitch looks up.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        let mut camera = Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        };
        camera.clamp_pitch();
        camera
    }

    /// Unit vector the camera looks along.
    pub fn get_view_vec(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.0.sin_cos();
        Vector3::new(pitch_cos * yaw_cos, pitch_sin, pitch_cos * yaw_sin).normalize()
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.get_view_vec(), Vector3::unit_y())
    }

    fn clamp_pitch(&mut self) {
        if self.pitch < -Rad(SAFE_FRAC_PI_2) {
            self.pitch = -Rad(SAFE_FRAC_PI_2);
        } else if self.pitch > Rad(SAFE_FRAC_PI_2) {
            self.pitch = Rad(SAFE_FRAC_PI_2);
        }
    }

    /// Applies and clears the controller's accumulated input.
    pub fn get_controller_updates_and_reset_controller(
        &mut self,
        controller: &mut CameraController,
        dt: Duration,
    ) {
        let dt = dt.as_secs_f32();

        // Move forward/backward and left/right on the horizontal plane
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        let forward = Vector3::new(yaw_cos, 0.0, yaw_sin).normalize();
        let right = Vector3::new(-yaw_sin, 0.0, yaw_cos).normalize();
        self.position += forward
            * (controller.amount_forward - controller.amount_backward)
            * controller.speed
            * dt;
        self.position +=
            right * (controller.amount_right - controller.amount_left) * controller.speed * dt;

        // Move up/down
        self.position.y += (controller.amount_up - controller.amount_down) * controller.speed * dt;

        // Mouse deltas are already per frame
        let scale = controller.sensitivity * RADIANS_PER_PIXEL;
        self.yaw += Rad(controller.rotate_horizontal * scale);
        self.pitch += Rad(-controller.rotate_vertical * scale);
        self.yaw = self.yaw.normalize();
        self.clamp_pitch();

        controller.reset();
    }
}

#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let fovy: Rad<f32> = fovy.into();
        Self {
            aspect,
            fovy,
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Collects one frame of movement and look input.
#[derive(Debug)]
pub struct CameraController {
    // Movement amounts, 0 or 1 per direction
    amount_left: f32,
    amount_right: f32,
    amount_forward: f32,
    amount_backward: f32,
    amount_up: f32,
    amount_down: f32,

    // Mouse motion in pixels
    rotate_horizontal: f32,
    rotate_vertical: f32,

    // Configuration
    speed: f32,
    sensitivity: f32,
}

impl CameraController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            amount_left: 0.0,
            amount_right: 0.0,
            amount_forward: 0.0,
            amount_backward: 0.0,
            amount_up: 0.0,
            amount_down: 0.0,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            speed,
            sensitivity,
        }
    }

    pub fn intake_actions(&mut self, actions: &PlayerAction) {
        let amount = |held: bool| if held { 1.0 } else { 0.0 };
        self.amount_forward = amount(actions.move_forward);
        self.amount_backward = amount(actions.move_backward);
        self.amount_left = amount(actions.move_left);
        self.amount_right = amount(actions.move_right);
        self.amount_up = amount(actions.move_up);
        self.amount_down = amount(actions.move_down);
        if let Some((delta_x, delta_y)) = actions.rotate_view {
            self.rotate_horizontal += delta_x as f32;
            self.rotate_vertical += delta_y as f32;
        }
    }

    pub fn has_updates(&self) -> bool {
        self.amount_forward > 0.0
            || self.amount_backward > 0.0
            || self.amount_left > 0.0
            || self.amount_right > 0.0
            || self.amount_up > 0.0
            || self.amount_down > 0.0
            || self.rotate_horizontal != 0.0
            || self.rotate_vertical != 0.0
    }

    fn reset(&mut self) {
        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;
        self.amount_up = 0.0;
        self.amount_down = 0.0;
        self.amount_left = 0.0;
        self.amount_right = 0.0;
        self.amount_forward = 0.0;
        self.amount_backward = 0.0;
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    // We can't use cgmath with bytemuck directly so we'll have to convert the Matrix4 into a 4x4 f32 array
    view_proj: [[f32; 4]; 4],
    position: [f32; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: cgmath::Matrix4::identity().into(),
            position: [0.0, 0.0, 0.0, 0.0],
        }
    }

    pub fn update_view_proj_and_pos(&mut self, camera: &Camera, projection: &Projection) {
        let viewproj = projection.calc_matrix() * camera.calc_matrix();
        self.view_proj = viewproj.into();
        let pos3: [f32; 3] = camera.position.into();

        self.position = [pos3[0], pos3[1], pos3[2], 0.0];
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(forward: bool, up: bool) -> PlayerAction {
        PlayerAction {
            move_forward: forward,
            move_up: up,
            ..PlayerAction::default()
        }
    }

    #[test]
    fn forward_follows_yaw() {
        let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
        let mut controller = CameraController::new(10.0, 1.0);
        controller.intake_actions(&held(true, false));
        camera.get_controller_updates_and_reset_controller(
            &mut controller,
            Duration::from_millis(500),
        );

        assert!((camera.position.x - 5.0).abs() < 1e-4);
        assert!(camera.position.z.abs() < 1e-4);
        assert!(!controller.has_updates());
    }

    #[test]
    fn vertical_movement_ignores_pitch() {
        let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(60.0));
        let mut controller = CameraController::new(4.0, 1.0);
        controller.intake_actions(&held(false, true));
        camera.get_controller_updates_and_reset_controller(&mut controller, Duration::from_secs(1));

        assert!((camera.position.y - 4.0).abs() < 1e-4);
        assert!(camera.position.x.abs() < 1e-4);
    }

    #[test]
    fn pitch_is_clamped_short_of_vertical() {
        let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
        let mut controller = CameraController::new(1.0, 1.0);
        let look_up = PlayerAction {
            rotate_view: Some((0.0, -100_000.0)),
            ..PlayerAction::default()
        };
        controller.intake_actions(&look_up);
        camera.get_controller_updates_and_reset_controller(&mut controller, Duration::from_millis(16));

        assert!(camera.pitch.0 <= SAFE_FRAC_PI_2);
        assert!(camera.pitch.0 > SAFE_FRAC_PI_2 - 1e-3);
        assert!(camera.get_view_vec().y < 1.0);
    }

    #[test]
    fn mouse_motion_accumulates_until_applied() {
        let mut controller = CameraController::new(1.0, 1.0);
        let nudge = PlayerAction {
            rotate_view: Some((3.0, 0.0)),
            ..PlayerAction::default()
        };
        controller.intake_actions(&nudge);
        controller.intake_actions(&nudge);

        let mut camera = Camera::new((0.0, 0.0, 0.0), Rad(0.0), Rad(0.0));
        camera.get_controller_updates_and_reset_controller(&mut controller, Duration::from_millis(16));
        assert!((camera.yaw.0 - 6.0 * RADIANS_PER_PIXEL).abs() < 1e-5);
    }

    #[test]
    fn uniform_matches_projection_times_view() {
        let camera = Camera::new((1.0, 2.0, 3.0), Deg(30.0), Deg(-10.0));
        let projection = Projection::new(800, 600, Deg(70.0), 0.1, 100.0);
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj_and_pos(&camera, &projection);

        let expected: [[f32; 4]; 4] = (projection.calc_matrix() * camera.calc_matrix()).into();
        assert_eq!(uniform.view_proj, expected);
        assert_eq!(uniform.position, [1.0, 2.0, 3.0, 0.0]);
    }
}
