//! # Application State Management
//!
//! This module handles the application's state management, including:
//! - Window and graphics initialization
//! - Input handling and cursor capture
//! - Application lifecycle events
//! - Frame pacing
//!
//! A left click captures the cursor for mouse look and block editing;
//! Escape or losing focus releases it.

pub mod frame_pacer;
pub mod graphics_resources_builder;
pub mod input_manager;
pub mod input_state;
pub mod lifecycle;

use std::process::ExitCode;
use std::sync::Arc;

use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowId},
};

use frame_pacer::FramePacer;
use graphics_resources_builder::create_graphics;
use input_manager::InputManager;
use lifecycle::Lifecycle;

use crate::{
    config::EngineConfig,
    engine_state::EngineState,
    error::{InitError, RenderError},
};

pub struct ApplicationState {
    config: EngineConfig,
    lifecycle: Lifecycle,
    state: Option<InitializedApplicationState>,
    init_error: Option<InitError>,
}

pub struct InitializedApplicationState {
    pub engine_state: EngineState,
    pub window: Arc<Window>,
    pub input_manager: InputManager,
    pub last_frame: web_time::Instant,
    pub frame_pacer: FramePacer,
    pub cursor_captured: bool,
}

impl ApplicationState {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            lifecycle: Lifecycle::Initializing,
            state: None,
            init_error: None,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Process exit status: failure if initialization failed.
    pub fn exit_code(&self) -> ExitCode {
        if self.init_error.is_some() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> Result<(), InitError> {
        let graphics = create_graphics(event_loop, &self.config.window)?;
        let engine_state = EngineState::new(
            graphics.surface,
            graphics.surface_config,
            graphics.device,
            graphics.queue,
            &self.config,
        )?;

        let now = web_time::Instant::now();
        self.state = Some(InitializedApplicationState {
            engine_state,
            window: graphics.window,
            input_manager: InputManager::new(),
            last_frame: now,
            frame_pacer: FramePacer::new(self.config.render.max_fps, now),
            cursor_captured: false,
        });
        Ok(())
    }

    fn transition(&mut self, next: Lifecycle) {
        if let Err(e) = self.lifecycle.transition(next) {
            warn!("{e}");
        }
    }

    /// Flushes the world and leaves the event loop.
    fn shut_down(&mut self, event_loop: &ActiveEventLoop) {
        if !self.lifecycle.is_running() {
            event_loop.exit();
            return;
        }
        self.transition(Lifecycle::ShuttingDown);
        if let Some(mut state) = self.state.take() {
            set_cursor_captured(&state.window, false);
            state.engine_state.shutdown();
        }
        self.transition(Lifecycle::Terminated);
        event_loop.exit();
    }

    fn run_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = &mut self.state else {
            return;
        };

        let now = web_time::Instant::now();
        let dt = now - state.last_frame;
        state.last_frame = now;
        state.frame_pacer.frame_started(now);

        let input = state.input_manager.get_and_reset_processed_input();
        state
            .engine_state
            .set_input_commands(&input, state.cursor_captured);

        match state.engine_state.frame(dt) {
            Ok(_) => {}
            Err(RenderError::OutOfMemory) => {
                error!("{}", RenderError::OutOfMemory);
                self.shut_down(event_loop);
            }
            Err(e) => warn!("Frame skipped: {e}"),
        }
    }
}

impl InitializedApplicationState {
    fn capture_cursor(&mut self, captured: bool) {
        if self.cursor_captured == captured {
            return;
        }
        self.cursor_captured = captured;
        set_cursor_captured(&self.window, captured);
        // The click or key that toggled capture must not also act in the world.
        self.input_manager.reset_inputs();
    }
}

fn set_cursor_captured(window: &Window, captured: bool) {
    let result = if captured {
        window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
    } else {
        window.set_cursor_grab(CursorGrabMode::None)
    };
    if let Err(e) = result {
        warn!("Cursor grab not available: {e}");
    }
    window.set_cursor_visible(!captured);
}

impl ApplicationHandler for ApplicationState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.lifecycle != Lifecycle::Initializing {
            return;
        }

        match self.initialize(event_loop) {
            Ok(()) => {
                self.transition(Lifecycle::Running);
                info!("Click to capture the mouse, Escape to release it");
            }
            Err(e) => {
                error!("Initialization failed: {e}");
                self.init_error = Some(e);
                self.transition(Lifecycle::Terminated);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => return self.shut_down(event_loop),
            WindowEvent::RedrawRequested => return self.run_frame(event_loop),
            _ => (),
        }

        let Some(state) = &mut self.state else {
            return;
        };

        state.input_manager.intake_input(&event);

        match event {
            WindowEvent::Resized(size) => state.engine_state.resize_surface(size),
            WindowEvent::Focused(false) => state.capture_cursor(false),
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } if !state.cursor_captured => state.capture_cursor(true),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => state.capture_cursor(false),
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let Some(state) = &mut self.state {
            if let DeviceEvent::MouseMotion { delta } = event {
                state.input_manager.intake_mouse_motion(delta);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = &mut self.state else {
            return;
        };

        let now = web_time::Instant::now();
        if state.frame_pacer.is_due(now) {
            state.window.request_redraw();
        }
        match state.frame_pacer.deadline() {
            Some(deadline) if deadline > now => {
                event_loop.set_control_flow(ControlFlow::WaitUntil(deadline))
            }
            _ => event_loop.set_control_flow(ControlFlow::Poll),
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        self.shut_down(event_loop);
    }
}
