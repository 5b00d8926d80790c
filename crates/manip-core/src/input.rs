//! Per-frame input snapshot

use glam::Vec2;

/// Mouse and keyboard state for one frame, polled by the host
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Left button is down this frame
    pub left_pressed: bool,
    /// Left button went down this frame
    pub left_just_pressed: bool,
    /// Left button went up this frame
    pub left_just_released: bool,
    /// Cursor position in screen pixels
    pub mouse_position: Vec2,
    /// Cursor movement since the previous frame
    pub mouse_delta: Vec2,
    /// Escape went down this frame
    pub escape_just_pressed: bool,
    /// Camera pan modifier (Alt) is held
    pub alt_held: bool,
}

impl FrameInput {
    /// Cursor resting at `position`, no buttons
    pub fn hover(position: Vec2) -> Self {
        Self {
            mouse_position: position,
            ..Self::default()
        }
    }

    /// Left button goes down at `position`
    pub fn press(position: Vec2) -> Self {
        Self {
            left_pressed: true,
            left_just_pressed: true,
            mouse_position: position,
            ..Self::default()
        }
    }

    /// Left button held while the cursor moves by `delta` to `position`
    pub fn drag(position: Vec2, delta: Vec2) -> Self {
        Self {
            left_pressed: true,
            mouse_position: position,
            mouse_delta: delta,
            ..Self::default()
        }
    }

    /// Left button goes up at `position`
    pub fn release(position: Vec2) -> Self {
        Self {
            left_just_released: true,
            mouse_position: position,
            ..Self::default()
        }
    }

    /// Escape pressed while the left button is still held
    pub fn escape(position: Vec2) -> Self {
        Self {
            left_pressed: true,
            escape_just_pressed: true,
            mouse_position: position,
            ..Self::default()
        }
    }

    pub fn with_alt(mut self) -> Self {
        self.alt_held = true;
        self
    }
}
