//! Player input as an explicit per-tick value
//!
//! The platform layer translates keys into `Button`s; the simulation only
//! ever reads the `InputState` handed to `tick`.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::vector::VectorExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    ShootUp,
    ShootDown,
    ShootLeft,
    ShootRight,
    Bomb,
}

/// Held buttons plus buttons that went down since the last tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    held: BTreeSet<Button>,
    pressed: BTreeSet<Button>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, button: Button) {
        if self.held.insert(button) {
            self.pressed.insert(button);
        }
    }

    pub fn release(&mut self, button: Button) {
        self.held.remove(&button);
    }

    pub fn is_held(&self, button: Button) -> bool {
        self.held.contains(&button)
    }

    /// True only on the tick the button went down
    pub fn was_pressed(&self, button: Button) -> bool {
        self.pressed.contains(&button)
    }

    /// Clear one-shot presses after the tick consumed them
    pub fn end_tick(&mut self) {
        self.pressed.clear();
    }

    /// Unit movement direction (zero when idle or opposing keys cancel)
    pub fn move_dir(&self) -> Vec2 {
        self.axis(Button::Left, Button::Right, Button::Up, Button::Down)
    }

    /// Unit shooting direction (zero when not shooting)
    pub fn shoot_dir(&self) -> Vec2 {
        self.axis(Button::ShootLeft, Button::ShootRight, Button::ShootUp, Button::ShootDown)
    }

    fn axis(&self, left: Button, right: Button, up: Button, down: Button) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.is_held(left) {
            dir.x -= 1.0;
        }
        if self.is_held(right) {
            dir.x += 1.0;
        }
        if self.is_held(up) {
            dir.y -= 1.0;
        }
        if self.is_held(down) {
            dir.y += 1.0;
        }
        dir.norm2()
    }
}
