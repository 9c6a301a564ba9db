//! Per-frame device state
//!
//! [`DeviceStateBuffer`] stores what the keyboard, mouse and active gamepad reported.
//! Digital controls live in fixed-size [`DigitalBank`]s indexed by [`KeyCode`] /
//! [`MouseButton`]; analog gamepad components live in maps keyed by [`ComponentId`].
//!
//! Every bank keeps three snapshots:
//!
//! ```text
//! record_*()          advance_frame()           advance_frame()
//! ──────────► recording ──────────► current ──────────► previous
//! ```
//!
//! Queries only ever see `current` and `previous`, so a whole frame of events becomes
//! visible at once and the previous/current pair always describes one frame boundary.

use crate::binding::ComponentId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Default number of key slots; covers every code a desktop keyboard reports
pub const DEFAULT_KEY_CAPACITY: usize = 512;
/// Default number of mouse button slots
pub const DEFAULT_MOUSE_CAPACITY: usize = 16;

/// Host key code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const ENTER: KeyCode = KeyCode(10);
    pub const SHIFT: KeyCode = KeyCode(16);
    pub const CONTROL: KeyCode = KeyCode(17);
    pub const ESCAPE: KeyCode = KeyCode(27);
    pub const SPACE: KeyCode = KeyCode(32);
    pub const LEFT: KeyCode = KeyCode(37);
    pub const UP: KeyCode = KeyCode(38);
    pub const RIGHT: KeyCode = KeyCode(39);
    pub const DOWN: KeyCode = KeyCode(40);
    pub const A: KeyCode = KeyCode(65);
    pub const D: KeyCode = KeyCode(68);
    pub const S: KeyCode = KeyCode(83);
    pub const W: KeyCode = KeyCode(87);
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key#{}", self.0)
    }
}

/// Host mouse button code (1 = left, 2 = middle, 3 = right)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MouseButton(pub u32);

impl MouseButton {
    pub const LEFT: MouseButton = MouseButton(1);
    pub const MIDDLE: MouseButton = MouseButton(2);
    pub const RIGHT: MouseButton = MouseButton(3);
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mouse#{}", self.0)
    }
}

/// Fixed-size bank of on/off controls with recording, current and previous snapshots
#[derive(Debug, Clone)]
pub struct DigitalBank {
    recording: Vec<bool>,
    current: Vec<bool>,
    previous: Vec<bool>,
}

impl DigitalBank {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            recording: vec![false; capacity],
            current: vec![false; capacity],
            previous: vec![false; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.recording.len()
    }

    /// Records a state change. Returns `false` (and changes nothing) when `index` is
    /// outside the bank.
    pub fn record(&mut self, index: usize, down: bool) -> bool {
        match self.recording.get_mut(index) {
            Some(slot) => {
                *slot = down;
                true
            }
            None => false,
        }
    }

    pub fn is_down(&self, index: usize) -> bool {
        self.current.get(index).copied().unwrap_or(false)
    }

    pub fn was_down(&self, index: usize) -> bool {
        self.previous.get(index).copied().unwrap_or(false)
    }

    /// Down this frame but not the last one
    pub fn rose(&self, index: usize) -> bool {
        self.is_down(index) && !self.was_down(index)
    }

    pub fn advance(&mut self) {
        self.previous.copy_from_slice(&self.current);
        self.current.copy_from_slice(&self.recording);
    }

    pub fn clear(&mut self) {
        self.recording.fill(false);
        self.current.fill(false);
        self.previous.fill(false);
    }

    fn pressed_count(&self) -> usize {
        self.current.iter().filter(|down| **down).count()
    }
}

/// Keyboard, mouse and gamepad state for one frame boundary
#[derive(Debug, Clone)]
pub struct DeviceStateBuffer {
    keys: DigitalBank,
    mouse_buttons: DigitalBank,
    mouse_position: (i32, i32),

    recording_components: HashMap<ComponentId, f32>,
    current_components: HashMap<ComponentId, f32>,
    previous_components: HashMap<ComponentId, f32>,
}

impl Default for DeviceStateBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_KEY_CAPACITY, DEFAULT_MOUSE_CAPACITY)
    }
}

impl DeviceStateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(key_capacity: usize, mouse_capacity: usize) -> Self {
        debug!(
            "Creating device state buffer: {} key slots, {} mouse slots",
            key_capacity, mouse_capacity
        );
        Self {
            keys: DigitalBank::with_capacity(key_capacity),
            mouse_buttons: DigitalBank::with_capacity(mouse_capacity),
            mouse_position: (0, 0),
            recording_components: HashMap::new(),
            current_components: HashMap::new(),
            previous_components: HashMap::new(),
        }
    }

    // Out-of-range codes are dropped silently; exotic hardware must not crash the host.

    pub fn record_key_down(&mut self, code: KeyCode) {
        self.keys.record(code.0 as usize, true);
    }

    pub fn record_key_up(&mut self, code: KeyCode) {
        self.keys.record(code.0 as usize, false);
    }

    pub fn record_mouse_down(&mut self, button: MouseButton) {
        self.mouse_buttons.record(button.0 as usize, true);
    }

    pub fn record_mouse_up(&mut self, button: MouseButton) {
        self.mouse_buttons.record(button.0 as usize, false);
    }

    pub fn record_mouse_position(&mut self, x: i32, y: i32) {
        self.mouse_position = (x, y);
    }

    /// Records a gamepad component value. Components the active device did not
    /// announce are ignored; returns whether the value was stored.
    pub fn record_component(&mut self, id: ComponentId, value: f32) -> bool {
        match self.recording_components.get_mut(&id) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Replaces the known component set, every value starting at 0.0
    pub fn reset_components(&mut self, ids: &[ComponentId]) {
        self.recording_components.clear();
        self.current_components.clear();
        self.previous_components.clear();
        for id in ids {
            self.recording_components.insert(*id, 0.0);
            self.current_components.insert(*id, 0.0);
            self.previous_components.insert(*id, 0.0);
        }
        debug!("Tracking {} controller components", ids.len());
    }

    /// Rotates snapshots: previous <- current <- recording.
    ///
    /// Call exactly once per frame after all events (including the controller poll)
    /// were recorded.
    pub fn advance_frame(&mut self) {
        self.keys.advance();
        self.mouse_buttons.advance();

        self.previous_components = std::mem::replace(
            &mut self.current_components,
            self.recording_components.clone(),
        );
    }

    /// Drops all key and mouse button state. Controller values are untouched.
    pub fn clear_on_focus_loss(&mut self) {
        debug!(
            "Focus lost, clearing {} keys and {} mouse buttons",
            self.keys.pressed_count(),
            self.mouse_buttons.pressed_count()
        );
        self.keys.clear();
        self.mouse_buttons.clear();
    }

    pub fn is_key_down(&self, code: KeyCode) -> bool {
        self.keys.is_down(code.0 as usize)
    }

    pub fn key_rose(&self, code: KeyCode) -> bool {
        self.keys.rose(code.0 as usize)
    }

    pub fn is_mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons.is_down(button.0 as usize)
    }

    pub fn mouse_rose(&self, button: MouseButton) -> bool {
        self.mouse_buttons.rose(button.0 as usize)
    }

    pub fn mouse_position(&self) -> (i32, i32) {
        self.mouse_position
    }

    pub fn component_value(&self, id: ComponentId) -> Option<f32> {
        self.current_components.get(&id).copied()
    }

    pub fn previous_component_value(&self, id: ComponentId) -> Option<f32> {
        self.previous_components.get(&id).copied()
    }

    pub fn key_capacity(&self) -> usize {
        self.keys.capacity()
    }

    pub fn mouse_capacity(&self) -> usize {
        self.mouse_buttons.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_becomes_visible_after_advance() {
        let mut buffer = DeviceStateBuffer::new();
        buffer.record_key_down(KeyCode::SPACE);
        assert!(!buffer.is_key_down(KeyCode::SPACE));

        buffer.advance_frame();
        assert!(buffer.is_key_down(KeyCode::SPACE));
        assert!(buffer.key_rose(KeyCode::SPACE));

        buffer.advance_frame();
        assert!(buffer.is_key_down(KeyCode::SPACE));
        assert!(!buffer.key_rose(KeyCode::SPACE));
    }

    #[test]
    fn repeated_down_events_are_harmless() {
        let mut buffer = DeviceStateBuffer::new();
        buffer.record_key_down(KeyCode::W);
        buffer.record_key_down(KeyCode::W);
        buffer.advance_frame();
        buffer.record_key_up(KeyCode::W);
        buffer.advance_frame();
        assert!(!buffer.is_key_down(KeyCode::W));
        assert!(!buffer.key_rose(KeyCode::W));
    }

    #[test]
    fn out_of_range_codes_are_ignored() {
        let mut buffer = DeviceStateBuffer::with_capacity(8, 2);
        buffer.record_key_down(KeyCode(8));
        buffer.record_key_down(KeyCode(u32::MAX));
        buffer.record_mouse_down(MouseButton(5));
        buffer.advance_frame();

        assert!(!buffer.is_key_down(KeyCode(8)));
        assert!(!buffer.is_mouse_down(MouseButton(5)));
        assert_eq!(buffer.key_capacity(), 8);
        assert_eq!(buffer.mouse_capacity(), 2);
    }

    #[test]
    fn mouse_buttons_and_position() {
        let mut buffer = DeviceStateBuffer::new();
        buffer.record_mouse_down(MouseButton::RIGHT);
        buffer.record_mouse_position(120, -4);
        buffer.advance_frame();

        assert!(buffer.is_mouse_down(MouseButton::RIGHT));
        assert!(buffer.mouse_rose(MouseButton::RIGHT));
        assert!(!buffer.is_mouse_down(MouseButton::LEFT));
        assert_eq!(buffer.mouse_position(), (120, -4));
    }

    #[test]
    fn focus_loss_clears_digital_but_not_analog_state() {
        let mut buffer = DeviceStateBuffer::new();
        buffer.reset_components(&[ComponentId::LeftStickX]);
        buffer.record_key_down(KeyCode::A);
        buffer.record_mouse_down(MouseButton::LEFT);
        buffer.record_component(ComponentId::LeftStickX, 0.8);
        buffer.advance_frame();

        buffer.clear_on_focus_loss();
        assert!(!buffer.is_key_down(KeyCode::A));
        assert!(!buffer.is_mouse_down(MouseButton::LEFT));
        assert_eq!(buffer.component_value(ComponentId::LeftStickX), Some(0.8));

        // nothing comes back on the next frame without a fresh key-down
        buffer.advance_frame();
        assert!(!buffer.is_key_down(KeyCode::A));
    }

    #[test]
    fn component_values_rotate_with_the_frame() {
        let mut buffer = DeviceStateBuffer::new();
        buffer.reset_components(&[ComponentId::RightZ]);
        assert_eq!(buffer.component_value(ComponentId::RightZ), Some(0.0));

        assert!(buffer.record_component(ComponentId::RightZ, 0.4));
        buffer.advance_frame();
        assert_eq!(buffer.component_value(ComponentId::RightZ), Some(0.4));
        assert_eq!(buffer.previous_component_value(ComponentId::RightZ), Some(0.0));

        buffer.advance_frame();
        assert_eq!(buffer.previous_component_value(ComponentId::RightZ), Some(0.4));
    }

    #[test]
    fn unknown_components_are_not_recorded() {
        let mut buffer = DeviceStateBuffer::new();
        buffer.reset_components(&[ComponentId::South]);
        assert!(!buffer.record_component(ComponentId::North, 1.0));
        buffer.advance_frame();
        assert_eq!(buffer.component_value(ComponentId::North), None);
    }
}
