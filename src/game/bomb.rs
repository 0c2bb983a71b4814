//! Bombs
//!
//! A bomb sits on a fuse, then detonates: detonation hooks run, and the
//! bomb grows into a blast that knocks out terrain it covers and reacts to
//! the opposing creature category every `BLAST_DAMAGE_INTERVAL` ticks and
//! on the final blast frame.

use std::rc::Rc;

use glam::{IVec2, Vec2};
use rand::Rng;

use super::creature::Creature;
use super::particle::{self, Effect, Particle, ParticleSpec, hsl};
use crate::consts::BLAST_DAMAGE_INTERVAL;
use crate::error::SimError;
use crate::sim::{Behavior, Body, Canvas, Entity, HookList, TickContext, TypeTag, VectorExt};

/// Runs once at detonation: `(bomb, body, data, ctx)`
pub type DetonateHook = dyn Fn(&Bomb, &Body, f32, &mut TickContext<'_>);

/// Runs for each creature caught in the blast: `(bomb, body, data, creature, ctx)`
pub type BlastHook = dyn Fn(&Bomb, &Body, f32, &mut Entity, &mut TickContext<'_>);

pub const BASIC_DAMAGE: &str = "Basic Damage";
pub const BOMB_SIZE: f32 = 75.0;

/// Per-creature bomb stats
#[derive(Debug, Clone)]
pub struct BombTemplate {
    pub fuse_time: i32,
    /// Ticks the blast takes to reach full radius
    pub time_to_explode: i32,
    pub blast_radius: f32,
    pub speed: f32,
    pub hue: f32,
    pub on_detonate: HookList<DetonateHook>,
    pub on_blast: HookList<BlastHook>,
}

impl Default for BombTemplate {
    fn default() -> Self {
        let mut on_blast: HookList<BlastHook> = HookList::new();
        on_blast.push(BASIC_DAMAGE, 12.0, Rc::new(basic_damage));
        Self {
            fuse_time: 180,
            time_to_explode: 20,
            blast_radius: 300.0,
            speed: 0.0,
            hue: 0.0,
            on_detonate: HookList::new(),
            on_blast,
        }
    }
}

/// Damage the creature, pushing it away from the bomb
pub fn basic_damage(_bomb: &Bomb, body: &Body, amount: f32, creature: &mut Entity, _ctx: &mut TickContext<'_>) {
    let away = creature.body.pos - body.pos;
    if let Some((target, target_body)) = creature.split_mut::<Creature>() {
        target.take_damage(target_body, amount, away);
    }
}

#[derive(Debug)]
pub struct Bomb {
    pub friendly: bool,
    /// Ticks to detonation; negative while exploding
    pub fuse: i32,
    pub max_fuse: i32,
    pub time_to_explode: i32,
    pub blast_radius: f32,
    pub hue: f32,
    pub on_detonate: HookList<DetonateHook>,
    pub on_blast: HookList<BlastHook>,
}

impl Bomb {
    /// Bomb entity at `pos`, rolling along the owner's heading if it has speed
    pub fn plant(template: &BombTemplate, friendly: bool, pos: Vec2, owner_vel: Vec2) -> Result<Entity, SimError> {
        let vel = if owner_vel.length() > 1.0 {
            owner_vel.norm2() * template.speed
        } else {
            Vec2::ZERO
        };
        let body = Body {
            vel,
            bounciness: 1.0,
            rubberiness: 1.0,
            ..Body::sized(pos, BOMB_SIZE, BOMB_SIZE)
        };
        let bomb = Bomb {
            friendly,
            fuse: template.fuse_time,
            max_fuse: template.fuse_time,
            time_to_explode: template.time_to_explode.max(1),
            blast_radius: template.blast_radius,
            hue: template.hue,
            on_detonate: template.on_detonate.clone(),
            on_blast: template.on_blast.clone(),
        };
        Entity::new(TypeTag::BOMB, body, bomb)
    }

    pub fn is_exploding(&self) -> bool {
        self.fuse <= 0
    }

    /// Current blast radius (zero before detonation)
    pub fn current_radius(&self) -> f32 {
        if self.fuse >= 0 {
            0.0
        } else {
            (-self.fuse) as f32 / self.time_to_explode as f32 * self.blast_radius
        }
    }

    fn detonate(&mut self, entity: &mut Entity, ctx: &mut TickContext<'_>) {
        log::debug!("Bomb {:?} detonated at {}", entity.id(), entity.body.pos);
        entity.body.hits_walls = false;
        entity.body.vel = Vec2::ZERO;
        for hook in self.on_detonate.iter() {
            (hook.func)(self, &entity.body, hook.data, ctx);
        }
        let target = if self.friendly {
            TypeTag::ENEMY
        } else {
            TypeTag::HERO
        };
        entity.reactions.register(target, blast_creature);
    }

    fn throw_sparks(&self, body: &Body, ctx: &mut TickContext<'_>) {
        let count = ctx.rng.random_range(6..26);
        let spec = ParticleSpec::blast();
        for _ in 0..count {
            let offset = Vec2::new(
                (ctx.rng.random::<f32>() - 0.5) * body.width * 0.5,
                (ctx.rng.random::<f32>() - 0.5) * body.height * 0.5,
            );
            let color = hsl(self.hue - 30.0 + ctx.rng.random::<f32>() * 30.0, 1.0, 0.5);
            let Ok(mut spark) = Particle::entity(body.pos + offset, color, Effect::Spark, &spec, &mut *ctx.rng) else {
                continue;
            };
            if !offset.is_zero_vec() {
                spark.body.vel = offset.norm2() * 10.2;
            }
            if !ctx.spawn_particle(spark) {
                break;
            }
        }
    }
}

fn blast_creature(this: &mut Entity, other: &mut Entity, ctx: &mut TickContext<'_>) {
    let Some((bomb, body)) = this.split_mut::<Bomb>() else {
        return;
    };
    let final_frame = bomb.fuse == -bomb.time_to_explode;
    if !final_frame && bomb.fuse % BLAST_DAMAGE_INTERVAL != 0 {
        return;
    }
    for hook in bomb.on_blast.iter() {
        (hook.func)(bomb, body, hook.data, other, ctx);
    }
}

impl Behavior for Bomb {
    fn action(&mut self, entity: &mut Entity, ctx: &mut TickContext<'_>) {
        self.fuse -= 1;
        if self.fuse == 0 {
            self.detonate(entity, ctx);
        } else if self.fuse < 0 && self.fuse >= -self.time_to_explode {
            let radius = self.current_radius();
            entity.body.width = radius * 2.0;
            entity.body.height = radius * 2.0;
            if entity.on_screen(&ctx.camera) {
                self.throw_sparks(&entity.body, ctx);
            }
        } else if self.fuse < -self.time_to_explode {
            entity.body.delete_me = true;
        }
    }

    fn draw(&self, entity: &Entity, canvas: &mut dyn Canvas) {
        if self.fuse > 0 {
            let elapsed = (self.max_fuse - self.fuse) as f32;
            let blink = 0.5 * (0.007 * elapsed.powf(1.5)).sin() + 0.5;
            canvas.circle(entity.body.pos, entity.body.width / 2.0, hsl(self.hue, blink, 0.25));
        } else if self.fuse >= -self.time_to_explode {
            canvas.circle(entity.body.pos, self.current_radius(), hsl(self.hue, 1.0, 0.5));
        }
    }

    fn collide_with_block(&mut self, _entity: &mut Entity, cell: IVec2, ctx: &mut TickContext<'_>) {
        if self.is_exploding() && ctx.field.destroy_block(cell, self.friendly) {
            let center = ctx.field.cell_center(cell);
            particle::debris(ctx, center);
        }
    }
}
