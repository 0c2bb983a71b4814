//! Deterministic simulation module
//!
//! Entity motion, terrain, collision detection and dispatch. This module
//! must stay deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod adjust;
pub mod block_field;
pub mod canvas;
pub mod collision;
pub mod entity;
pub mod hooks;
pub mod input;
pub mod tick;
pub mod vector;
pub mod world;

pub use adjust::adjust_entity;
pub use block_field::{BlockEdit, BlockField, Cell, CellRange, DESTROY_THRESHOLD, Durability};
pub use canvas::{Canvas, DrawCommand, DrawList};
pub use collision::{Aabb, Circle, Overlap, Rect, Shape, ShapeKind, reflect_velocity, test_overlap};
pub use entity::{AsAny, Behavior, Body, CollisionTable, Entity, EntityId, Reaction, Sides, TypeTag};
pub use hooks::{Hook, HookList};
pub use input::{Button, InputState};
pub use tick::{TickStats, tick};
pub use vector::{Vector, VectorExt};
pub use world::{Camera, TickContext, World};
