//! Creatures: the hero and enemies
//!
//! Health is reduced through an arctan defense curve; damage past zero
//! health turns into knockback. Creatures carry bullet and bomb templates
//! whose hook lists power-ups extend.

use std::collections::BTreeMap;
use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;

use glam::Vec2;

use super::bomb::{BASIC_DAMAGE, Bomb, BombTemplate};
use super::bullet::{Bullet, BulletTemplate};
use super::particle::{self, Effect, ParticleSpec};
use crate::error::SimError;
use crate::sim::{Behavior, Body, Button, Canvas, Entity, TickContext, TypeTag, VectorExt};

/// Share of overkill damage converted into velocity
pub const OVERKILL_KNOCKBACK: f32 = 0.75;
/// Health below which a creature dies
pub const DEATH_THRESHOLD: f32 = 0.01;
pub const HERO_COLOR: u32 = 0x3080FF;
pub const ENEMY_COLOR: u32 = 0xE04040;

/// Fraction of incoming damage that gets through `defense`.
/// 1.0 at zero defense, about half at 1.2, approaching zero.
pub fn defense_multiplier(defense: f32) -> f32 {
    FRAC_PI_2 - (defense + 1.0 / 1.0_f32.tan()).atan()
}

/// Who drives the creature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controller {
    /// Movement, shooting and bombs from `InputState`
    Input,
    Idle,
}

#[derive(Debug, Clone)]
pub struct Creature {
    pub friendly: bool,
    pub max_health: f32,
    health: f32,
    pub defense: f32,
    pub max_bombs: u32,
    bombs: u32,
    /// Ticks between shots
    pub fire_delay: u32,
    fire_count: u32,
    pub bullets_per_shot: u32,
    /// Cone angle for multi-bullet shots, in degrees
    pub spread_degrees: f32,
    pub acceleration: f32,
    pub movement_multiplier: f32,
    pub bullet: BulletTemplate,
    pub bomb: BombTemplate,
    pub controller: Controller,
    /// Unit vector the creature last moved along
    pub facing: Vec2,
    pub color: u32,
    power_ups: BTreeMap<&'static str, u32>,
}

impl Creature {
    pub fn new(friendly: bool) -> Self {
        Self {
            friendly,
            max_health: 20.0,
            health: 20.0,
            defense: 0.0,
            max_bombs: 3,
            bombs: 3,
            fire_delay: 30,
            fire_count: 0,
            bullets_per_shot: 1,
            spread_degrees: 30.0,
            acceleration: 1.5,
            movement_multiplier: 1.0,
            bullet: BulletTemplate::new(friendly),
            bomb: BombTemplate::default(),
            controller: Controller::Idle,
            facing: Vec2::Y,
            color: if friendly { HERO_COLOR } else { ENEMY_COLOR },
            power_ups: BTreeMap::new(),
        }
    }

    /// Player-controlled creature
    pub fn hero() -> Self {
        let mut hero = Self::new(true);
        hero.max_health = 100.0;
        hero.health = 100.0;
        hero.fire_delay = 10;
        hero.bullet.speed = 16.0;
        hero.bomb.hue = 200.0;
        hero.controller = Controller::Input;
        hero
    }

    pub fn enemy() -> Self {
        Self::new(false)
    }

    /// Wrap in an entity tagged by allegiance
    pub fn into_entity(self, pos: Vec2, size: f32) -> Result<Entity, SimError> {
        let tag = if self.friendly {
            TypeTag::HERO
        } else {
            TypeTag::ENEMY
        };
        let body = Body {
            drag: 0.1,
            ..Body::sized(pos, size, size)
        };
        Entity::new(tag, body, self)
    }

    #[inline]
    pub fn health(&self) -> f32 {
        self.health
    }

    #[inline]
    pub fn bombs(&self) -> u32 {
        self.bombs
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Apply damage coming from `dir`. Overkill becomes knockback; the
    /// creature is flagged for deletion once health runs out.
    pub fn take_damage(&mut self, body: &mut Body, amount: f32, dir: Vec2) {
        let taken = amount * defense_multiplier(self.defense);
        if taken > self.health {
            body.vel += dir.norm2() * ((taken - self.health) * OVERKILL_KNOCKBACK);
        }
        self.health -= taken;
        if self.health < DEATH_THRESHOLD {
            self.health = 0.0;
            body.delete_me = true;
        }
    }

    /// Heal up to max health
    pub fn gain_health(&mut self, amount: f32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    /// Add or remove bombs, clamped to `[0, max_bombs]`
    pub fn add_bombs(&mut self, amount: i32) {
        let next = self.bombs as i64 + amount as i64;
        self.bombs = next.clamp(0, self.max_bombs as i64) as u32;
    }

    /// Basic damage dealt by this creature's bombs
    pub fn bomb_damage(&self) -> Option<f32> {
        self.bomb.on_blast.data(BASIC_DAMAGE)
    }

    pub fn set_bomb_damage(&mut self, damage: f32) -> bool {
        self.bomb.on_blast.set_data(BASIC_DAMAGE, damage)
    }

    /// Total magnitude applied so far for a power-up
    pub fn power_up_level(&self, name: &str) -> u32 {
        self.power_ups.get(name).copied().unwrap_or(0)
    }

    pub(crate) fn record_power_up(&mut self, name: &'static str, magnitude: u32) {
        *self.power_ups.entry(name).or_insert(0) += magnitude;
    }

    /// Try to fire along `dir`. Multi-bullet shots fan out evenly across
    /// the spread cone. Returns true when bullets were fired.
    pub fn shoot(&mut self, body: &Body, dir: Vec2, extra_velocity: Vec2, ctx: &mut TickContext<'_>) -> bool {
        let dir = dir.norm2();
        if self.fire_count < self.fire_delay {
            self.fire_count += 1;
        }
        if dir.is_zero_vec() || self.fire_count < self.fire_delay {
            return false;
        }

        let template = Rc::new(self.bullet.clone());
        let count = self.bullets_per_shot.max(1);
        let extent = body.width.min(body.height);
        for i in 0..count {
            let heading = if count > 1 {
                let t = i as f32 / (count - 1) as f32;
                dir.rotated_by((t * self.spread_degrees - self.spread_degrees / 2.0).to_radians())
            } else {
                dir
            };
            match Bullet::fire(&template, body.pos, heading, extent) {
                Ok(mut bullet) => {
                    bullet.body.vel += extra_velocity;
                    ctx.spawn(bullet);
                }
                Err(e) => log::warn!("Bullet not fired: {e}"),
            }
        }
        self.fire_count = 0;
        true
    }

    /// Place a bomb at `pos` if any are left
    pub fn place_bomb(&mut self, owner: &Body, pos: Vec2, ctx: &mut TickContext<'_>) -> bool {
        if self.bombs == 0 {
            return false;
        }
        match Bomb::plant(&self.bomb, self.friendly, pos, owner.vel) {
            Ok(bomb) => {
                ctx.spawn(bomb);
                self.add_bombs(-1);
                true
            }
            Err(e) => {
                log::warn!("Bomb not placed: {e}");
                false
            }
        }
    }
}

impl Behavior for Creature {
    fn action(&mut self, entity: &mut Entity, ctx: &mut TickContext<'_>) {
        match self.controller {
            Controller::Input => {
                let input = ctx.input;
                let dir = input.move_dir();
                entity.body.acc = dir * (self.acceleration * self.movement_multiplier);
                if !dir.is_zero_vec() {
                    self.facing = dir;
                }
                self.shoot(&entity.body, input.shoot_dir(), Vec2::ZERO, ctx);
                if input.was_pressed(Button::Bomb) {
                    let pos = entity.body.pos;
                    self.place_bomb(&entity.body, pos, ctx);
                }
            }
            Controller::Idle => {
                entity.body.acc = Vec2::ZERO;
                self.fire_count = (self.fire_count + 1).min(self.fire_delay);
            }
        }
    }

    fn draw(&self, entity: &Entity, canvas: &mut dyn Canvas) {
        let body = &entity.body;
        canvas.circle(body.pos, body.width / 2.0, self.color);
        if self.max_health > 0.0 {
            let left = body.pos - Vec2::new(body.width / 2.0, body.height / 2.0 + 8.0);
            let filled = body.width * (self.health / self.max_health);
            canvas.line(left, left + Vec2::new(filled, 0.0), 4.0, 0x40E040);
        }
    }

    fn destroy(&mut self, entity: &mut Entity, ctx: &mut TickContext<'_>) {
        log::debug!("{} {:?} died at {}", entity.tag, entity.id(), entity.body.pos);
        let color = self.color;
        particle::burst(ctx, entity.body.pos, 20, Effect::Spark, &ParticleSpec::default(), |_| color);
    }
}
