//! Player intent handed over by the host's input layer.

use bevy::prelude::*;

/// Input for one controlled body.
///
/// The host writes it at its own frame rate. Edge flags (`*_pressed`) and the
/// accumulated `yaw_delta` stay latched until a fixed tick consumes them, so
/// a press between two ticks is never lost.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveInput {
    /// x strafes right, y moves forward. Clamped to unit length when read.
    pub axis: Vec2,
    pub jump_pressed: bool,
    pub jump_held: bool,
    pub crouch_pressed: bool,
    pub crouch_held: bool,
    /// Radians about the body's up, accumulated since the last tick.
    pub yaw_delta: f32,
}

impl MoveInput {
    pub fn press_jump(&mut self) {
        self.jump_pressed = true;
        self.jump_held = true;
    }

    pub fn release_jump(&mut self) {
        self.jump_held = false;
    }

    pub fn press_crouch(&mut self) {
        self.crouch_pressed = true;
        self.crouch_held = true;
    }

    pub fn release_crouch(&mut self) {
        self.crouch_held = false;
    }

    pub fn add_yaw(&mut self, radians: f32) {
        self.yaw_delta += radians;
    }

    /// Clear what a tick has used up. Held state stays.
    pub fn consume_edges(&mut self) {
        self.jump_pressed = false;
        self.crouch_pressed = false;
        self.yaw_delta = 0.0;
    }

    #[must_use]
    pub fn clamped_axis(&self) -> Vec2 {
        self.axis.clamp_length_max(1.0)
    }
}
