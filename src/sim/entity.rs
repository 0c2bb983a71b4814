//! Entity contract shared by every simulated object
//!
//! An `Entity` is physical state (`Body`), a category tag, a per-instance
//! table of reactions keyed by the *other* entity's tag, and an optional
//! `Behavior` holding category-specific state. The engine never branches
//! on concrete types; all gameplay flows through behaviors and reactions.

use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::canvas::Canvas;
use super::collision::{Circle, Rect, Shape, ShapeKind, test_overlap};
use super::world::{Camera, TickContext};
use crate::error::SimError;

/// Stable entity identifier, unique within a `World`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Category tag. Open-ended so gameplay code can invent new categories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(Cow<'static, str>);

impl TypeTag {
    pub const HERO: TypeTag = TypeTag::from_static("Hero");
    pub const ENEMY: TypeTag = TypeTag::from_static("Enemy");
    pub const PLAYER_BULLET: TypeTag = TypeTag::from_static("PlayerBullet");
    pub const ENEMY_BULLET: TypeTag = TypeTag::from_static("EnemyBullet");
    pub const BOMB: TypeTag = TypeTag::from_static("Bomb");
    pub const PARTICLE: TypeTag = TypeTag::from_static("Particle");
    pub const POWER_UP: TypeTag = TypeTag::from_static("PowerUp");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which sides of an entity are stopped by terrain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sides {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl Sides {
    pub const ALL: Sides = Sides {
        left: true,
        right: true,
        top: true,
        bottom: true,
    };
    pub const NONE: Sides = Sides {
        left: false,
        right: false,
        top: false,
        bottom: false,
    };
}

impl Default for Sides {
    fn default() -> Self {
        Sides::ALL
    }
}

/// Physical state of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub acc: Vec2,
    /// Fraction of velocity lost per tick, in [0, 1]
    pub drag: f32,
    pub width: f32,
    pub height: f32,
    /// Explicit shape; derived from width/height when `None`
    pub shape: Option<ShapeKind>,
    /// Hitbox scale against terrain
    pub block_hitbox_scalar: f32,
    /// Hitbox scale against other entities
    pub entity_hitbox_scalar: f32,
    pub collides: Sides,
    pub bounciness: f32,
    pub rubberiness: f32,
    /// Remaining ticks; the entity deletes itself when this runs out
    pub lifetime: Option<u32>,
    /// When false, terrain contacts are reported but never pushed out
    pub hits_walls: bool,
    pub delete_me: bool,
}

impl Default for Body {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            acc: Vec2::ZERO,
            drag: 0.0,
            width: 0.0,
            height: 0.0,
            shape: None,
            block_hitbox_scalar: 1.0,
            entity_hitbox_scalar: 1.0,
            collides: Sides::ALL,
            bounciness: 0.0,
            rubberiness: 0.0,
            lifetime: None,
            hits_walls: true,
            delete_me: false,
        }
    }
}

impl Body {
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            ..Self::default()
        }
    }

    pub fn sized(pos: Vec2, width: f32, height: f32) -> Self {
        Self {
            pos,
            width,
            height,
            ..Self::default()
        }
    }

    /// Reject NaN, negative extents and out-of-range coefficients
    pub fn validate(&self) -> Result<(), SimError> {
        for (what, v) in [
            ("position", self.pos),
            ("velocity", self.vel),
            ("acceleration", self.acc),
        ] {
            if !v.is_finite() {
                return Err(SimError::NonFinite {
                    what,
                    x: v.x,
                    y: v.y,
                });
            }
        }
        for (what, value) in [("width", self.width), ("height", self.height)] {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::InvalidExtent { what, value });
            }
        }
        if !(0.0..=1.0).contains(&self.drag) {
            return Err(SimError::InvalidScalar {
                what: "drag",
                value: self.drag,
            });
        }
        for (what, value) in [
            ("block hitbox scalar", self.block_hitbox_scalar),
            ("entity hitbox scalar", self.entity_hitbox_scalar),
            ("bounciness", self.bounciness),
            ("rubberiness", self.rubberiness),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::InvalidScalar { what, value });
            }
        }
        Ok(())
    }

    pub fn shape_kind(&self) -> ShapeKind {
        self.shape
            .unwrap_or_else(|| ShapeKind::derive(self.width, self.height))
    }

    /// Collision shape at the current position with the given hitbox scale
    pub fn shape_scaled(&self, scalar: f32) -> Shape {
        match self.shape_kind() {
            ShapeKind::Circle => Shape::Circle(Circle {
                center: self.pos,
                radius: self.width.max(self.height) * 0.5 * scalar,
            }),
            ShapeKind::Rectangle => Shape::Rect(Rect {
                center: self.pos,
                half: Vec2::new(self.width, self.height) * 0.5 * scalar,
            }),
        }
    }

    pub fn terrain_shape(&self) -> Shape {
        self.shape_scaled(self.block_hitbox_scalar)
    }

    pub fn entity_shape(&self) -> Shape {
        self.shape_scaled(self.entity_hitbox_scalar)
    }

    /// Integrate one tick: `vel = (vel + acc) * (1 - drag); pos += vel`
    pub fn integrate(&mut self) {
        self.vel = (self.vel + self.acc) * (1.0 - self.drag);
        self.pos += self.vel;
    }

    /// Count down the lifetime, flagging deletion when it runs out
    pub fn age(&mut self) {
        if let Some(remaining) = self.lifetime {
            let remaining = remaining.saturating_sub(1);
            self.lifetime = Some(remaining);
            if remaining == 0 {
                self.delete_me = true;
            }
        }
    }
}

/// Object-safe access to `Any` for downcasting behaviors
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Category-specific behavior. The entity passed in has its behavior slot
/// empty for the duration of the call.
pub trait Behavior: AsAny {
    fn action(&mut self, _entity: &mut Entity, _ctx: &mut TickContext<'_>) {}

    fn draw(&self, _entity: &Entity, _canvas: &mut dyn Canvas) {}

    /// Runs exactly once, at the sweep that removes the entity
    fn destroy(&mut self, _entity: &mut Entity, _ctx: &mut TickContext<'_>) {}

    fn collide_with_block(&mut self, _entity: &mut Entity, _cell: IVec2, _ctx: &mut TickContext<'_>) {}
}

/// Reaction of one entity (`this`) to overlapping another (`other`)
pub type Reaction = Box<dyn FnMut(&mut Entity, &mut Entity, &mut TickContext<'_>)>;

/// Per-instance reactions keyed by the other entity's tag
#[derive(Default)]
pub struct CollisionTable {
    // `None` while the reaction is running
    slots: HashMap<TypeTag, Option<Reaction>>,
}

impl CollisionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the reaction to `tag`
    pub fn register<F>(&mut self, tag: TypeTag, reaction: F)
    where
        F: FnMut(&mut Entity, &mut Entity, &mut TickContext<'_>) + 'static,
    {
        self.slots.insert(tag, Some(Box::new(reaction)));
    }

    pub fn unregister(&mut self, tag: &TypeTag) -> bool {
        self.slots.remove(tag).is_some()
    }

    pub fn reacts_to(&self, tag: &TypeTag) -> bool {
        self.slots.get(tag).is_some_and(Option::is_some)
    }

    /// Registered tags in sorted order
    pub fn tags(&self) -> Vec<&TypeTag> {
        let mut tags: Vec<_> = self.slots.keys().collect();
        tags.sort();
        tags
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn take(&mut self, tag: &TypeTag) -> Option<Reaction> {
        self.slots.get_mut(tag).and_then(Option::take)
    }

    /// Put a finished reaction back unless it replaced or removed itself
    fn restore(&mut self, tag: &TypeTag, reaction: Reaction) {
        if let Some(slot) = self.slots.get_mut(tag) {
            if slot.is_none() {
                *slot = Some(reaction);
            }
        }
    }
}

impl fmt::Debug for CollisionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.tags()).finish()
    }
}

/// A simulated object
pub struct Entity {
    id: EntityId,
    spawned_tick: u64,
    destroyed: bool,
    pub tag: TypeTag,
    pub body: Body,
    pub reactions: CollisionTable,
    behavior: Option<Box<dyn Behavior>>,
}

impl Entity {
    pub fn new(tag: TypeTag, body: Body, behavior: impl Behavior) -> Result<Self, SimError> {
        let mut entity = Self::inert(tag, body)?;
        entity.behavior = Some(Box::new(behavior));
        Ok(entity)
    }

    /// Entity without a behavior (pure physics plus reactions)
    pub fn inert(tag: TypeTag, body: Body) -> Result<Self, SimError> {
        body.validate()?;
        Ok(Self {
            id: EntityId(0),
            spawned_tick: 0,
            destroyed: false,
            tag,
            body,
            reactions: CollisionTable::new(),
            behavior: None,
        })
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Frame in which the entity joined the world
    #[inline]
    pub fn spawned_tick(&self) -> u64 {
        self.spawned_tick
    }

    #[inline]
    pub fn is_pending_delete(&self) -> bool {
        self.body.delete_me
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub(crate) fn admit(&mut self, id: EntityId, frame: u64) {
        self.id = id;
        self.spawned_tick = frame;
    }

    pub fn behavior<T: Behavior>(&self) -> Option<&T> {
        self.behavior.as_deref()?.as_any().downcast_ref::<T>()
    }

    pub fn behavior_mut<T: Behavior>(&mut self) -> Option<&mut T> {
        self.behavior.as_deref_mut()?.as_any_mut().downcast_mut::<T>()
    }

    /// Behavior and body borrowed together
    pub fn split_mut<T: Behavior>(&mut self) -> Option<(&mut T, &mut Body)> {
        let behavior = self.behavior.as_deref_mut()?.as_any_mut().downcast_mut::<T>()?;
        Some((behavior, &mut self.body))
    }

    /// Whether the entity overlaps the viewport
    pub fn on_screen(&self, camera: &Camera) -> bool {
        test_overlap(&self.body.entity_shape(), &camera.view_shape()).is_some()
    }

    pub fn action(&mut self, ctx: &mut TickContext<'_>) {
        if let Some(mut behavior) = self.behavior.take() {
            behavior.action(self, ctx);
            self.behavior = Some(behavior);
        }
    }

    /// Integrate motion and age the lifetime counter
    pub fn step(&mut self) {
        self.body.integrate();
        self.body.age();
    }

    pub fn draw(&self, canvas: &mut dyn Canvas) {
        if let Some(behavior) = &self.behavior {
            behavior.draw(self, canvas);
        }
    }

    pub(crate) fn collide_with_block(&mut self, cell: IVec2, ctx: &mut TickContext<'_>) {
        if let Some(mut behavior) = self.behavior.take() {
            behavior.collide_with_block(self, cell, ctx);
            self.behavior = Some(behavior);
        }
    }

    /// Run the destroy hook. Subsequent calls do nothing.
    pub(crate) fn destroy(&mut self, ctx: &mut TickContext<'_>) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.body.delete_me = true;
        if let Some(mut behavior) = self.behavior.take() {
            behavior.destroy(self, ctx);
            self.behavior = Some(behavior);
        }
    }

    /// Invoke this entity's reaction to `other`, if it has one
    pub fn react(&mut self, other: &mut Entity, ctx: &mut TickContext<'_>) -> bool {
        let tag = other.tag.clone();
        let Some(mut reaction) = self.reactions.take(&tag) else {
            return false;
        };
        reaction(self, other, ctx);
        self.reactions.restore(&tag, reaction);
        true
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("pos", &self.body.pos)
            .field("delete_me", &self.body.delete_me)
            .field("reactions", &self.reactions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::block_field::BlockField;
    use crate::sim::input::InputState;
    use crate::sim::world::World;

    struct Marker(u32);
    impl Behavior for Marker {}

    struct Other;
    impl Behavior for Other {}

    fn world() -> World {
        let field = BlockField::new(10, 10, Vec2::splat(60.0)).unwrap();
        World::new(field, &Settings::default())
    }

    #[test]
    fn test_validation_rejects_bad_bodies() {
        let nan = Body {
            vel: Vec2::new(f32::NAN, 0.0),
            ..Body::default()
        };
        assert!(matches!(
            Entity::inert(TypeTag::HERO, nan),
            Err(SimError::NonFinite { what: "velocity", .. })
        ));
        let negative = Body::sized(Vec2::ZERO, -1.0, 4.0);
        assert!(matches!(
            Entity::inert(TypeTag::HERO, negative),
            Err(SimError::InvalidExtent { what: "width", .. })
        ));
        let drag = Body {
            drag: 1.5,
            ..Body::default()
        };
        assert!(matches!(
            Entity::inert(TypeTag::HERO, drag),
            Err(SimError::InvalidScalar { what: "drag", .. })
        ));
        assert!(Entity::inert(TypeTag::HERO, Body::sized(Vec2::ZERO, 0.0, 0.0)).is_ok());
    }

    #[test]
    fn test_shape_derivation_and_scalars() {
        let mut body = Body::sized(Vec2::new(5.0, 5.0), 20.0, 20.0);
        body.block_hitbox_scalar = 0.5;
        body.entity_hitbox_scalar = 2.0;
        match body.terrain_shape() {
            Shape::Circle(c) => assert_eq!(c.radius, 5.0),
            other => panic!("expected circle, got {other:?}"),
        }
        match body.entity_shape() {
            Shape::Circle(c) => assert_eq!(c.radius, 20.0),
            other => panic!("expected circle, got {other:?}"),
        }

        let rect = Body::sized(Vec2::ZERO, 40.0, 10.0);
        match rect.entity_shape() {
            Shape::Rect(r) => assert_eq!(r.half, Vec2::new(20.0, 5.0)),
            other => panic!("expected rect, got {other:?}"),
        }

        let forced = Body {
            shape: Some(ShapeKind::Rectangle),
            ..Body::sized(Vec2::ZERO, 10.0, 10.0)
        };
        assert!(matches!(forced.entity_shape(), Shape::Rect(_)));
    }

    #[test]
    fn test_step_applies_drag_then_moves() {
        let mut body = Body {
            vel: Vec2::new(10.0, 0.0),
            acc: Vec2::new(0.0, 2.0),
            drag: 0.5,
            ..Body::default()
        };
        body.integrate();
        assert_eq!(body.vel, Vec2::new(5.0, 1.0));
        assert_eq!(body.pos, Vec2::new(5.0, 1.0));
    }

    #[test]
    fn test_lifetime_expiry_sets_delete_flag() {
        let mut entity = Entity::inert(
            TypeTag::PARTICLE,
            Body {
                lifetime: Some(2),
                ..Body::default()
            },
        )
        .unwrap();
        entity.step();
        assert!(!entity.is_pending_delete());
        entity.step();
        assert!(entity.is_pending_delete());
        assert_eq!(entity.body.lifetime, Some(0));
    }

    #[test]
    fn test_downcast_behavior() {
        let mut entity = Entity::new(TypeTag::HERO, Body::default(), Marker(7)).unwrap();
        assert_eq!(entity.behavior::<Marker>().map(|m| m.0), Some(7));
        assert!(entity.behavior::<Other>().is_none());
        if let Some((marker, body)) = entity.split_mut::<Marker>() {
            marker.0 += 1;
            body.pos.x = 3.0;
        }
        assert_eq!(entity.behavior::<Marker>().map(|m| m.0), Some(8));
        assert_eq!(entity.body.pos.x, 3.0);
    }

    #[test]
    fn test_unregistered_pairing_is_a_no_op() {
        let mut world = world();
        let mut a = Entity::inert(TypeTag::PLAYER_BULLET, Body::default()).unwrap();
        a.reactions.register(TypeTag::ENEMY, |this, _, _| this.body.delete_me = true);
        let mut hero = Entity::inert(TypeTag::HERO, Body::default()).unwrap();
        let fired = world.scoped_context(&InputState::new(), |ctx| a.react(&mut hero, ctx));
        assert!(!fired);
        assert!(!a.is_pending_delete());
    }

    #[test]
    fn test_reaction_can_replace_itself() {
        let mut world = world();
        let input = InputState::new();
        let mut a = Entity::inert(TypeTag::HERO, Body::default()).unwrap();
        a.reactions.register(TypeTag::ENEMY, |this, _, _| {
            this.body.pos.x += 1.0;
            this.reactions
                .register(TypeTag::ENEMY, |this, _, _| this.body.pos.x += 100.0);
        });
        let mut enemy = Entity::inert(TypeTag::ENEMY, Body::default()).unwrap();
        world.scoped_context(&input, |ctx| {
            assert!(a.react(&mut enemy, ctx));
            assert!(a.react(&mut enemy, ctx));
        });
        assert_eq!(a.body.pos.x, 101.0);
    }

    #[test]
    fn test_reaction_can_unregister_itself() {
        let mut world = world();
        let input = InputState::new();
        let mut a = Entity::inert(TypeTag::HERO, Body::default()).unwrap();
        a.reactions.register(TypeTag::ENEMY, |this, _, _| {
            this.body.pos.x += 1.0;
            this.reactions.unregister(&TypeTag::ENEMY);
        });
        let mut enemy = Entity::inert(TypeTag::ENEMY, Body::default()).unwrap();
        world.scoped_context(&input, |ctx| {
            assert!(a.react(&mut enemy, ctx));
            assert!(!a.react(&mut enemy, ctx));
        });
        assert_eq!(a.body.pos.x, 1.0);
        assert!(a.reactions.is_empty());
    }

    #[test]
    fn test_destroy_runs_once() {
        struct Counting;
        impl Behavior for Counting {
            fn destroy(&mut self, entity: &mut Entity, _ctx: &mut TickContext<'_>) {
                entity.body.pos.x += 1.0;
            }
        }
        let mut world = world();
        let mut entity = Entity::new(TypeTag::BOMB, Body::default(), Counting).unwrap();
        world.scoped_context(&InputState::new(), |ctx| {
            entity.destroy(ctx);
            entity.destroy(ctx);
        });
        assert_eq!(entity.body.pos.x, 1.0);
        assert!(entity.is_destroyed());
    }

    #[test]
    fn test_on_screen_against_viewport() {
        let camera = Camera::new(Vec2::new(100.0, 100.0));
        let visible = Entity::inert(TypeTag::HERO, Body::sized(Vec2::new(50.0, 50.0), 10.0, 10.0)).unwrap();
        let hidden = Entity::inert(TypeTag::HERO, Body::sized(Vec2::new(500.0, 50.0), 10.0, 10.0)).unwrap();
        assert!(visible.on_screen(&camera));
        assert!(!hidden.on_screen(&camera));
    }
}
