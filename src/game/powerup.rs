//! Power-ups and pickups
//!
//! Each power-up has a cap. A magnitude that would overshoot the cap is
//! trimmed; at the cap the power-up does nothing. Xplode stacks by bumping
//! the data of its existing on-destroy hook instead of adding a second one.

use std::f32::consts::TAU;
use std::rc::Rc;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::bullet::Bullet;
use super::creature::Creature;
use super::particle::{self, hsl};
use crate::error::SimError;
use crate::polar_to_cartesian;
use crate::sim::{Behavior, Body, Canvas, Entity, TickContext, TypeTag};

pub const MAX_MAX_HEALTH: f32 = 1000.0;
pub const HEALTH_FACTOR: f32 = 10.0;
pub const MAX_BOMB_DAMAGE: f32 = 1000.0;
pub const DAMAGE_FACTOR: f32 = 1.0;
pub const MAX_EXPLODES: f32 = 10.0;
pub const BULLET_DAMAGE_FACTOR: f32 = 1.2;
/// Split bullets fly at this fraction of the template speed
pub const SPLIT_SPEED: f32 = 0.75;
pub const PICKUP_SIZE: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PowerUpKind {
    HealthUp,
    Nitroglycerin,
    Xplode,
}

impl PowerUpKind {
    pub fn name(&self) -> &'static str {
        match self {
            PowerUpKind::HealthUp => "Health Up",
            PowerUpKind::Nitroglycerin => "Nitroglycerin",
            PowerUpKind::Xplode => "Xplode",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PowerUpKind::HealthUp => "Increases your max health",
            PowerUpKind::Nitroglycerin => "Increases your bomb damage",
            PowerUpKind::Xplode => "Your bullets explode into more bullets",
        }
    }

    fn hue(&self) -> f32 {
        match self {
            PowerUpKind::HealthUp => 120.0,
            PowerUpKind::Nitroglycerin => 30.0,
            PowerUpKind::Xplode => 280.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    /// Strength, 1 to 5
    pub magnitude: u32,
}

impl PowerUp {
    pub fn new(kind: PowerUpKind, magnitude: u32) -> Self {
        Self {
            kind,
            magnitude: magnitude.clamp(1, 5),
        }
    }

    /// Magnitude that still fits under the cap, or `None` at the cap
    pub fn room(&self, creature: &Creature) -> Option<u32> {
        let available = match self.kind {
            PowerUpKind::HealthUp => {
                if creature.max_health >= MAX_MAX_HEALTH {
                    return None;
                }
                ((MAX_MAX_HEALTH - creature.max_health) / HEALTH_FACTOR).floor()
            }
            PowerUpKind::Nitroglycerin => {
                let existing = creature.bomb_damage()?;
                if existing >= MAX_BOMB_DAMAGE {
                    return None;
                }
                ((MAX_BOMB_DAMAGE - existing) / DAMAGE_FACTOR).floor()
            }
            PowerUpKind::Xplode => match creature.bullet.on_destroy.data(PowerUpKind::Xplode.name()) {
                Some(existing) if existing >= MAX_EXPLODES => return None,
                Some(existing) => (MAX_EXPLODES - existing).abs().floor(),
                None => return Some(self.magnitude),
            },
        };
        if available < 1.0 {
            return None;
        }
        Some(self.magnitude.min(available as u32))
    }

    /// Apply to `creature`. Returns false when already at the cap.
    pub fn apply(&self, creature: &mut Creature) -> bool {
        let name = self.kind.name();
        let Some(magnitude) = self.room(creature) else {
            log::debug!("{name} already at max");
            return false;
        };
        creature.record_power_up(name, magnitude);
        let amount = magnitude as f32;

        match self.kind {
            PowerUpKind::HealthUp => {
                creature.max_health += amount * HEALTH_FACTOR;
                creature.gain_health(amount * HEALTH_FACTOR);
            }
            PowerUpKind::Nitroglycerin => {
                let current = creature.bomb_damage().unwrap_or(0.0);
                creature.set_bomb_damage(current + amount * DAMAGE_FACTOR);
            }
            PowerUpKind::Xplode => {
                creature.bullet.damage *= BULLET_DAMAGE_FACTOR / amount;
                match creature.bullet.on_destroy.find_mut(name) {
                    Some(hook) => hook.data += amount,
                    None => creature.bullet.on_destroy.push(name, amount, Rc::new(split_bullet)),
                }
            }
        }
        log::info!("Applied {name} x{magnitude}");
        true
    }
}

/// Split a dying bullet into `count` bullets spread evenly around a random
/// starting angle. Children do not split again.
pub fn split_bullet(bullet: &Bullet, body: &Body, count: f32, ctx: &mut TickContext<'_>) {
    let count = count.max(0.0) as u32;
    if count == 0 {
        return;
    }
    let template = &bullet.template;
    let on_destroy = bullet.on_destroy.without(PowerUpKind::Xplode.name());
    let start = ctx.rng.random_range(0.0..TAU);
    for i in 0..count {
        let dir = polar_to_cartesian(1.0, start + i as f32 / count as f32 * TAU);
        let (damage, size) = template.directional(dir);
        let vel = dir * (template.speed * SPLIT_SPEED);
        match Bullet::launch(template, body.pos, vel, damage, size, on_destroy.clone()) {
            Ok(child) => ctx.spawn(child),
            Err(e) => log::warn!("Split bullet dropped: {e}"),
        }
    }
}

/// A power-up lying in the world, applied when the hero touches it
#[derive(Debug, Clone)]
pub struct Pickup {
    pub power_up: PowerUp,
}

impl Pickup {
    pub fn entity(power_up: PowerUp, pos: Vec2) -> Result<Entity, SimError> {
        let mut entity = Entity::new(
            TypeTag::POWER_UP,
            Body::sized(pos, PICKUP_SIZE, PICKUP_SIZE),
            Pickup { power_up },
        )?;
        entity.reactions.register(TypeTag::HERO, collect);
        Ok(entity)
    }
}

fn collect(this: &mut Entity, hero: &mut Entity, ctx: &mut TickContext<'_>) {
    if this.is_pending_delete() {
        return;
    }
    let Some(power_up) = this.behavior::<Pickup>().map(|p| p.power_up) else {
        return;
    };
    let Some(creature) = hero.behavior_mut::<Creature>() else {
        return;
    };
    power_up.apply(creature);
    this.body.delete_me = true;
    particle::rainbow(ctx, this.body.pos, 30);
}

impl Behavior for Pickup {
    fn draw(&self, entity: &Entity, canvas: &mut dyn Canvas) {
        let size = Vec2::new(entity.body.width, entity.body.height);
        canvas.rect(entity.body.pos, size, hsl(self.power_up.kind.hue(), 1.0, 0.5));
    }
}
