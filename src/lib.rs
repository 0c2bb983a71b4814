//! Cave Crawl - A tile-based cave shooter simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, terrain grid, collisions, tick loop)
//! - `game`: Gameplay entity types built on the `sim` entity contract
//! - `settings`: Data-driven configuration
//! - `error`: Construction and configuration errors

pub mod error;
pub mod game;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, SimError};
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one game step per 60 Hz frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Terrain tile dimensions
    pub const BLOCK_WIDTH: f32 = 60.0;
    pub const BLOCK_HEIGHT: f32 = 60.0;

    /// Viewport dimensions
    pub const SCREEN_WIDTH: f32 = 1920.0;
    pub const SCREEN_HEIGHT: f32 = 1080.0;

    /// Durability of freshly generated terrain blocks
    pub const BLOCK_DURABILITY: f32 = 1.0;

    /// Ticks a bomb's blast keeps damaging before it is done
    pub const BLAST_DAMAGE_INTERVAL: i32 = 30;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: Vec2) -> (f32, f32) {
    (pos.length(), pos.y.atan2(pos.x))
}
