//! Decorative particles
//!
//! Particles are ordinary entities with a lifetime and no reactions. They
//! go through the world's particle budget, so effects thin out on low
//! quality settings instead of piling up.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::error::SimError;
use crate::polar_to_cartesian;
use crate::sim::{Behavior, Body, Canvas, Entity, Sides, TickContext, TypeTag};

pub const DEBRIS_COLOR: u32 = 0x000000;

/// How a particle draws itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Square,
    /// A streak along the velocity
    Spark,
}

/// Randomization ranges for a particle burst
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSpec {
    pub base_speed: f32,
    pub rand_speed: f32,
    pub drag: f32,
    pub base_lifetime: u32,
    pub rand_lifetime: u32,
    pub acc: Vec2,
    pub size: f32,
    pub line_width: f32,
    /// Spark length as a multiple of velocity
    pub multiplier: f32,
}

impl Default for ParticleSpec {
    fn default() -> Self {
        Self {
            base_speed: 10.0,
            rand_speed: 3.0,
            drag: 0.08,
            base_lifetime: 20,
            rand_lifetime: 30,
            acc: Vec2::ZERO,
            size: 16.0,
            line_width: 1.0,
            multiplier: 5.0,
        }
    }
}

impl ParticleSpec {
    /// Block fragments knocked out of terrain
    pub fn debris() -> Self {
        Self {
            base_speed: 5.0,
            rand_speed: 3.0,
            ..Self::default()
        }
    }

    /// Bright streaks thrown off a bomb blast
    pub fn blast() -> Self {
        Self {
            base_speed: 5.0,
            rand_speed: 5.0,
            drag: 0.04,
            base_lifetime: 80,
            rand_lifetime: 40,
            size: 20.0,
            line_width: 8.0,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub effect: Effect,
    pub color: u32,
    pub line_width: f32,
    pub multiplier: f32,
}

impl Particle {
    /// Particle entity flying off in a random direction
    pub fn entity(
        pos: Vec2,
        color: u32,
        effect: Effect,
        spec: &ParticleSpec,
        rng: &mut Pcg32,
    ) -> Result<Entity, SimError> {
        let speed = spec.base_speed + spec.rand_speed * rng.random::<f32>();
        let vel = polar_to_cartesian(speed, rng.random_range(0.0..TAU));
        let extra = if spec.rand_lifetime > 0 {
            rng.random_range(0..spec.rand_lifetime)
        } else {
            0
        };
        let body = Body {
            vel,
            acc: spec.acc,
            drag: spec.drag,
            lifetime: Some(spec.base_lifetime + extra),
            collides: Sides::NONE,
            hits_walls: false,
            ..Body::sized(pos, spec.size, spec.size)
        };
        let particle = Particle {
            effect,
            color,
            line_width: spec.line_width,
            multiplier: spec.multiplier,
        };
        Entity::new(TypeTag::PARTICLE, body, particle)
    }
}

impl Behavior for Particle {
    fn draw(&self, entity: &Entity, canvas: &mut dyn Canvas) {
        let body = &entity.body;
        match self.effect {
            Effect::Square => canvas.rect(body.pos, Vec2::new(body.width, body.height), self.color),
            Effect::Spark => canvas.line(body.pos, body.pos + body.vel * self.multiplier, self.line_width, self.color),
        }
    }
}

/// Spawn up to `count` particles. Returns how many fit in the budget.
pub fn burst(
    ctx: &mut TickContext<'_>,
    pos: Vec2,
    count: usize,
    effect: Effect,
    spec: &ParticleSpec,
    color: impl Fn(&mut Pcg32) -> u32,
) -> usize {
    let mut spawned = 0;
    for _ in 0..count.min(ctx.particle_room()) {
        let tint = color(&mut *ctx.rng);
        match Particle::entity(pos, tint, effect, spec, &mut *ctx.rng) {
            Ok(p) => {
                if ctx.spawn_particle(p) {
                    spawned += 1;
                }
            }
            Err(e) => {
                log::warn!("Dropping particle: {e}");
                break;
            }
        }
    }
    spawned
}

/// Debris from a destroyed block
pub fn debris(ctx: &mut TickContext<'_>, pos: Vec2) -> usize {
    burst(ctx, pos, 15, Effect::Square, &ParticleSpec::debris(), |_| DEBRIS_COLOR)
}

/// Multicolored sparks, used for pickups
pub fn rainbow(ctx: &mut TickContext<'_>, pos: Vec2, amount: usize) -> usize {
    let spec = ParticleSpec {
        line_width: 15.0,
        multiplier: 8.0,
        ..ParticleSpec::default()
    };
    burst(ctx, pos, amount, Effect::Spark, &spec, |rng| hsl(rng.random_range(0.0..360.0), 1.0, 0.5))
}

/// HSL (hue in degrees, saturation and lightness in [0, 1]) to 0xRRGGBB
pub fn hsl(hue: f32, saturation: f32, lightness: f32) -> u32 {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    let channel = |v: f32| ((v + m).clamp(0.0, 1.0) * 255.0).round() as u32;
    (channel(r) << 16) | (channel(g) << 8) | channel(b)
}
