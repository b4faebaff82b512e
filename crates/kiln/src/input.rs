//! Keyboard and mouse input state.
//!
//! [`InputState`] tracks which keys/buttons are currently pressed, just
//! pressed this frame, or just released this frame, plus the cursor
//! position. The window shell feeds it from winit events and clears the
//! per-frame sets after each update.

use std::collections::HashSet;
use std::hash::Hash;

pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

/// Tracks the state of a set of inputs (keys or mouse buttons).
///
/// - `pressed`: currently held down
/// - `just_pressed`: pressed this frame (not held last frame)
/// - `just_released`: released this frame
#[derive(Debug, Clone)]
pub struct Input<T: Eq + Hash + Copy> {
    pressed: HashSet<T>,
    just_pressed: HashSet<T>,
    just_released: HashSet<T>,
}

impl<T: Eq + Hash + Copy> Input<T> {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    /// Returns `true` if the input is currently held down.
    pub fn pressed(&self, input: T) -> bool {
        self.pressed.contains(&input)
    }

    /// Returns `true` if the input was pressed this frame.
    pub fn just_pressed(&self, input: T) -> bool {
        self.just_pressed.contains(&input)
    }

    /// Returns `true` if the input was released this frame.
    pub fn just_released(&self, input: T) -> bool {
        self.just_released.contains(&input)
    }

    /// Returns `true` if anything is held down.
    pub fn any_pressed(&self) -> bool {
        !self.pressed.is_empty()
    }

    /// Record a press. Returns `false` for key repeat (already held).
    pub(crate) fn press(&mut self, input: T) -> bool {
        let fresh = self.pressed.insert(input);
        if fresh {
            self.just_pressed.insert(input);
        }
        fresh
    }

    /// Record a release. Returns `false` if the input was not held.
    pub(crate) fn release(&mut self, input: T) -> bool {
        let held = self.pressed.remove(&input);
        if held {
            self.just_released.insert(input);
        }
        held
    }

    /// Clear per-frame state.
    pub(crate) fn clear_just(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }

    /// Forget everything, e.g. when the window loses focus.
    pub(crate) fn reset(&mut self) {
        self.pressed.clear();
        self.clear_just();
    }
}

impl<T: Eq + Hash + Copy> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Mouse cursor position in window coordinates (pixels, origin top-left).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CursorPosition {
    pub x: f32,
    pub y: f32,
}

/// Everything the shell knows about the user's input this frame.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub keys: Input<KeyCode>,
    pub mouse: Input<MouseButton>,
    pub cursor: CursorPosition,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear just-pressed / just-released for every device.
    pub(crate) fn end_frame(&mut self) {
        self.keys.clear_just();
        self.mouse.clear_just();
    }

    pub(crate) fn reset(&mut self) {
        self.keys.reset();
        self.mouse.reset();
    }
}
