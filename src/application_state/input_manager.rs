//! # Input Manager
//!
//! This module handles input processing for the application, including:
//! - Keyboard input state tracking
//! - Mouse button state tracking
//! - Relative mouse motion, summed over a frame
//!
//! Raw window and device events are written into the "new" state as they
//! arrive. Once per frame [`InputManager::get_and_reset_processed_input`]
//! compares it with the state at the end of the previous frame to produce
//! Pressed / Held / Released transitions.

use std::collections::HashMap;

use winit::{
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use super::input_state::{MouseInput, ProcessedInputState, RawInputState};

const KEY_CODES: [KeyCode; 13] = [
    KeyCode::KeyW,
    KeyCode::KeyS,
    KeyCode::KeyA,
    KeyCode::KeyD,
    KeyCode::Space,
    KeyCode::ShiftLeft,
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::F3,
    KeyCode::Escape,
];

const MOUSE_BUTTONS: [MouseButton; 3] = [MouseButton::Left, MouseButton::Right, MouseButton::Middle];

/// Manages the state of all input devices and processes input events.
pub struct InputManager {
    /// Previous state of all tracked keyboard keys
    pub keyboard_inputs_old: HashMap<KeyCode, bool>,
    /// Current state of all tracked keyboard keys
    pub keyboard_inputs_new: HashMap<KeyCode, bool>,

    /// Current state of mouse inputs
    pub mouse_inputs: MouseInput,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    /// Creates a new InputManager with every tracked key and button released.
    pub fn new() -> Self {
        let keyboard_inputs_old: HashMap<KeyCode, bool> =
            KEY_CODES.iter().map(|key| (*key, false)).collect();
        let keyboard_inputs_new = keyboard_inputs_old.clone();

        let mouse_button_inputs_old: HashMap<MouseButton, bool> =
            MOUSE_BUTTONS.iter().map(|button| (*button, false)).collect();
        let mouse_button_inputs_new = mouse_button_inputs_old.clone();

        Self {
            keyboard_inputs_old,
            keyboard_inputs_new,
            mouse_inputs: MouseInput {
                mouse_button_inputs_old,
                mouse_button_inputs_new,
                mouse_delta: None,
            },
        }
    }

    /// Copies the current down states into the previous-frame states.
    pub fn move_old_states(&mut self) {
        for (key, new_state) in self.keyboard_inputs_new.iter() {
            if let Some(old_state) = self.keyboard_inputs_old.get_mut(key) {
                *old_state = *new_state;
            }
        }

        for (button, new_state) in self.mouse_inputs.mouse_button_inputs_new.iter() {
            if let Some(old_state) = self.mouse_inputs.mouse_button_inputs_old.get_mut(button) {
                *old_state = *new_state;
            }
        }
    }

    /// Records keyboard and mouse button events. Other events are ignored.
    pub fn intake_input(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state,
                        physical_key: PhysicalKey::Code(key),
                        ..
                    },
                ..
            } => self.set_key(*key, *state == ElementState::Pressed),
            WindowEvent::MouseInput { button, state, .. } => {
                self.set_mouse_button(*button, *state == ElementState::Pressed)
            }
            WindowEvent::Focused(false) => self.release_all(),
            _ => {}
        }
    }

    /// Sets the down state of a tracked key. Untracked keys are ignored.
    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        if let Some(key_state) = self.keyboard_inputs_new.get_mut(&key) {
            *key_state = pressed;
        }
    }

    /// Sets the down state of a tracked mouse button.
    pub fn set_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if let Some(button_state) = self.mouse_inputs.mouse_button_inputs_new.get_mut(&button) {
            *button_state = pressed;
        }
    }

    /// Marks every key and button as up, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.keyboard_inputs_new.values_mut().for_each(|state| *state = false);
        self.mouse_inputs
            .mouse_button_inputs_new
            .values_mut()
            .for_each(|state| *state = false);
    }

    /// Adds relative mouse motion to this frame's total.
    pub fn intake_mouse_motion(&mut self, delta: (f64, f64)) {
        let (x, y) = self.mouse_inputs.mouse_delta.unwrap_or((0.0, 0.0));
        self.mouse_inputs.mouse_delta = Some((x + delta.0, y + delta.1));
    }

    pub fn create_processed_input_state(&self) -> ProcessedInputState {
        let keyboard_states = self
            .keyboard_inputs_new
            .iter()
            .map(|(key, &new_state)| {
                let old_state = self.keyboard_inputs_old.get(key).copied().unwrap_or(false);
                (*key, RawInputState::from_raw_states(old_state, new_state))
            })
            .collect();

        let mouse_button_states = self
            .mouse_inputs
            .mouse_button_inputs_new
            .iter()
            .map(|(button, &new_state)| {
                let old_state = self
                    .mouse_inputs
                    .mouse_button_inputs_old
                    .get(button)
                    .copied()
                    .unwrap_or(false);
                (*button, RawInputState::from_raw_states(old_state, new_state))
            })
            .collect();

        ProcessedInputState {
            keyboard_states,
            mouse_button_states,
            mouse_delta: self.mouse_inputs.mouse_delta,
        }
    }

    /// Produces this frame's input snapshot and starts the next frame.
    pub fn get_and_reset_processed_input(&mut self) -> ProcessedInputState {
        let processed_input = self.create_processed_input_state();
        self.reset_inputs();
        processed_input
    }

    pub fn reset_inputs(&mut self) {
        self.move_old_states();
        self.mouse_inputs.mouse_delta = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_goes_through_pressed_held_released() {
        let mut input = InputManager::new();

        input.set_key(KeyCode::KeyW, true);
        let frame = input.get_and_reset_processed_input();
        assert_eq!(frame.get_key_state(KeyCode::KeyW), RawInputState::Pressed);

        let frame = input.get_and_reset_processed_input();
        assert_eq!(frame.get_key_state(KeyCode::KeyW), RawInputState::Held);

        input.set_key(KeyCode::KeyW, false);
        let frame = input.get_and_reset_processed_input();
        assert_eq!(frame.get_key_state(KeyCode::KeyW), RawInputState::Released);

        let frame = input.get_and_reset_processed_input();
        assert_eq!(frame.get_key_state(KeyCode::KeyW), RawInputState::NotPressed);
    }

    #[test]
    fn tap_within_one_frame_is_not_seen() {
        let mut input = InputManager::new();
        input.set_mouse_button(MouseButton::Left, true);
        input.set_mouse_button(MouseButton::Left, false);
        let frame = input.get_and_reset_processed_input();
        assert_eq!(
            frame.get_mouse_button_state(MouseButton::Left),
            RawInputState::NotPressed
        );
    }

    #[test]
    fn mouse_button_transitions() {
        let mut input = InputManager::new();
        input.set_mouse_button(MouseButton::Right, true);
        let frame = input.get_and_reset_processed_input();
        assert!(frame
            .get_mouse_button_state(MouseButton::Right)
            .is_just_pressed());
        let frame = input.get_and_reset_processed_input();
        assert_eq!(
            frame.get_mouse_button_state(MouseButton::Right),
            RawInputState::Held
        );
    }

    #[test]
    fn mouse_motion_is_summed_per_frame() {
        let mut input = InputManager::new();
        input.intake_mouse_motion((1.5, -2.0));
        input.intake_mouse_motion((0.5, 4.0));
        input.intake_mouse_motion((-1.0, 1.0));

        let frame = input.get_and_reset_processed_input();
        assert_eq!(frame.get_mouse_delta(), Some((1.0, 3.0)));

        let frame = input.get_and_reset_processed_input();
        assert_eq!(frame.get_mouse_delta(), None);
    }

    #[test]
    fn untracked_keys_are_ignored() {
        let mut input = InputManager::new();
        input.set_key(KeyCode::KeyQ, true);
        let frame = input.get_and_reset_processed_input();
        assert!(!frame.keyboard_states.contains_key(&KeyCode::KeyQ));
    }

    #[test]
    fn losing_focus_releases_everything() {
        let mut input = InputManager::new();
        input.set_key(KeyCode::KeyD, true);
        input.get_and_reset_processed_input();

        input.intake_input(&WindowEvent::Focused(false));
        let frame = input.get_and_reset_processed_input();
        assert_eq!(frame.get_key_state(KeyCode::KeyD), RawInputState::Released);
    }
}
