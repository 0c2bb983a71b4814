//! Draw-pass sink
//!
//! Entities describe themselves through `Canvas`; the actual renderer lives
//! outside the simulation. `DrawList` records commands for headless runs.

use glam::Vec2;

pub trait Canvas {
    fn circle(&mut self, center: Vec2, radius: f32, color: u32);
    fn rect(&mut self, center: Vec2, size: Vec2, color: u32);
    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: u32);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Circle { center: Vec2, radius: f32, color: u32 },
    Rect { center: Vec2, size: Vec2, color: u32 },
    Line { from: Vec2, to: Vec2, width: f32, color: u32 },
}

/// Recorded draw commands for one frame
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Canvas for DrawList {
    fn circle(&mut self, center: Vec2, radius: f32, color: u32) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn rect(&mut self, center: Vec2, size: Vec2, color: u32) {
        self.commands.push(DrawCommand::Rect {
            center,
            size,
            color,
        });
    }

    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: u32) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            width,
            color,
        });
    }
}
