//! Bullets
//!
//! A bullet reacts to the opposing creature category: it deals damage,
//! knocks the target back, runs its on-hit hooks and is spent. Terrain it
//! touches is knocked out. On-destroy hooks run when the sweep removes it.

use std::rc::Rc;

use glam::{IVec2, Vec2};

use super::creature::Creature;
use super::particle;
use crate::error::SimError;
use crate::sim::{Behavior, Body, Canvas, Entity, HookList, TickContext, TypeTag, VectorExt};

/// Runs when a bullet is removed: `(bullet, body, data, ctx)`
pub type DestroyHook = dyn Fn(&Bullet, &Body, f32, &mut TickContext<'_>);

/// Runs after a bullet damages a creature: `(bullet, target, data, ctx)`
pub type HitHook = dyn Fn(&Bullet, &mut Entity, f32, &mut TickContext<'_>);

/// Per-creature bullet stats, copied into each shot
#[derive(Debug, Clone)]
pub struct BulletTemplate {
    pub friendly: bool,
    pub speed: f32,
    pub lifetime: u32,
    pub damage: f32,
    pub size: f32,
    /// Extra damage and size for shots aimed left or right
    pub left_damage: f32,
    pub right_damage: f32,
    pub left_size: f32,
    pub right_size: f32,
    pub knockback: f32,
    pub reflects_off_walls: bool,
    pub wall_reflect_speed: f32,
    pub color: u32,
    pub on_destroy: HookList<DestroyHook>,
    pub on_hit: HookList<HitHook>,
}

impl BulletTemplate {
    pub fn new(friendly: bool) -> Self {
        Self {
            friendly,
            speed: 12.0,
            lifetime: 100,
            damage: 10.0,
            size: 24.0,
            left_damage: 0.0,
            right_damage: 0.0,
            left_size: 0.0,
            right_size: 0.0,
            knockback: 3.0,
            reflects_off_walls: false,
            wall_reflect_speed: 0.0,
            color: 0xFFFFFF,
            on_destroy: HookList::new(),
            on_hit: HookList::new(),
        }
    }

    /// Damage and size for a shot heading along `dir`
    pub fn directional(&self, dir: Vec2) -> (f32, f32) {
        let cos = dir.norm2().x;
        let right = cos.max(0.0);
        let left = (-cos).max(0.0);
        (
            self.damage + self.right_damage * right + self.left_damage * left,
            self.size + self.right_size * right + self.left_size * left,
        )
    }
}

pub struct Bullet {
    pub friendly: bool,
    pub damage: f32,
    pub knockback: f32,
    pub reflects_off_walls: bool,
    pub wall_reflect_speed: f32,
    pub color: u32,
    pub on_destroy: HookList<DestroyHook>,
    pub on_hit: HookList<HitHook>,
    /// Stats for bullets split off this one
    pub template: Rc<BulletTemplate>,
    spent: bool,
}

impl Bullet {
    /// Shoot from a creature at `origin`, starting a quarter of its
    /// footprint out along `dir`
    pub fn fire(
        template: &Rc<BulletTemplate>,
        origin: Vec2,
        dir: Vec2,
        owner_extent: f32,
    ) -> Result<Entity, SimError> {
        let dir = dir.norm2();
        let (damage, size) = template.directional(dir);
        let pos = origin + dir * (owner_extent / 4.0);
        Self::launch(
            template,
            pos,
            dir * template.speed,
            damage,
            size,
            template.on_destroy.clone(),
        )
    }

    /// Bullet entity with explicit state
    pub fn launch(
        template: &Rc<BulletTemplate>,
        pos: Vec2,
        vel: Vec2,
        damage: f32,
        size: f32,
        on_destroy: HookList<DestroyHook>,
    ) -> Result<Entity, SimError> {
        let body = Body {
            vel,
            lifetime: Some(template.lifetime),
            bounciness: if template.reflects_off_walls { 1.0 } else { 0.0 },
            rubberiness: 1.0,
            ..Body::sized(pos, size, size)
        };
        let bullet = Bullet {
            friendly: template.friendly,
            damage,
            knockback: template.knockback,
            reflects_off_walls: template.reflects_off_walls,
            wall_reflect_speed: template.wall_reflect_speed,
            color: template.color,
            on_destroy,
            on_hit: template.on_hit.clone(),
            template: Rc::clone(template),
            spent: false,
        };
        let (tag, target) = if template.friendly {
            (TypeTag::PLAYER_BULLET, TypeTag::ENEMY)
        } else {
            (TypeTag::ENEMY_BULLET, TypeTag::HERO)
        };
        let mut entity = Entity::new(tag, body, bullet)?;
        entity.reactions.register(target, hit_creature);
        Ok(entity)
    }

    pub fn is_spent(&self) -> bool {
        self.spent
    }
}

fn hit_creature(this: &mut Entity, other: &mut Entity, ctx: &mut TickContext<'_>) {
    let Some((bullet, body)) = this.split_mut::<Bullet>() else {
        return;
    };
    if bullet.spent {
        return;
    }
    bullet.spent = true;
    body.delete_me = true;

    let dir = body.vel.norm2();
    if let Some((creature, target)) = other.split_mut::<Creature>() {
        creature.take_damage(target, bullet.damage, dir);
        target.vel += dir * bullet.knockback;
    }
    for hook in bullet.on_hit.iter() {
        (hook.func)(bullet, other, hook.data, ctx);
    }
}

impl Behavior for Bullet {
    fn draw(&self, entity: &Entity, canvas: &mut dyn Canvas) {
        canvas.circle(entity.body.pos, entity.body.width / 2.0, self.color);
    }

    fn destroy(&mut self, entity: &mut Entity, ctx: &mut TickContext<'_>) {
        for hook in self.on_destroy.iter() {
            (hook.func)(self, &entity.body, hook.data, ctx);
        }
    }

    fn collide_with_block(&mut self, entity: &mut Entity, cell: IVec2, ctx: &mut TickContext<'_>) {
        if ctx.field.destroy_block(cell, self.friendly) {
            let center = ctx.field.cell_center(cell);
            particle::debris(ctx, center);
        }
        if !self.reflects_off_walls {
            self.spent = true;
            entity.body.delete_me = true;
        } else if self.wall_reflect_speed > 0.0 {
            entity.body.vel = entity.body.vel.norm2() * self.wall_reflect_speed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::settings::Settings;
    use crate::sim::{BlockEdit, BlockField, DrawList, InputState, World, tick};

    fn world() -> World {
        let field = BlockField::new(10, 10, Vec2::splat(60.0)).unwrap();
        World::new(field, &Settings::default())
    }

    fn run(world: &mut World, ticks: usize) {
        let input = InputState::new();
        let mut canvas = DrawList::new();
        for _ in 0..ticks {
            tick(world, &input, &mut canvas);
        }
    }

    #[test]
    fn test_directional_bonus() {
        let template = BulletTemplate {
            right_damage: 4.0,
            left_size: 6.0,
            ..BulletTemplate::new(true)
        };
        assert_eq!(template.directional(Vec2::X), (14.0, 24.0));
        assert_eq!(template.directional(Vec2::NEG_X), (10.0, 30.0));
        assert_eq!(template.directional(Vec2::Y), (10.0, 24.0));
    }

    #[test]
    fn test_fire_offsets_from_owner() {
        let template = Rc::new(BulletTemplate::new(true));
        let bullet = Bullet::fire(&template, Vec2::new(100.0, 100.0), Vec2::new(0.0, 2.0), 40.0).unwrap();
        assert_eq!(bullet.body.pos, Vec2::new(100.0, 110.0));
        assert_eq!(bullet.body.vel, Vec2::new(0.0, 12.0));
        assert_eq!(bullet.tag, TypeTag::PLAYER_BULLET);
        assert!(bullet.reactions.reacts_to(&TypeTag::ENEMY));
        assert!(!bullet.reactions.reacts_to(&TypeTag::HERO));
    }

    #[test]
    fn test_bullet_damages_enemy_once() {
        let mut world = world();
        let template = Rc::new(BulletTemplate {
            speed: 0.0,
            ..BulletTemplate::new(true)
        });
        let enemy = world.add(Creature::enemy().into_entity(Vec2::new(300.0, 300.0), 40.0).unwrap());
        let first = Bullet::fire(&template, Vec2::new(300.0, 300.0), Vec2::X, 0.0).unwrap();
        let second = Bullet::fire(&template, Vec2::new(301.0, 300.0), Vec2::X, 0.0).unwrap();
        world.add(first);
        world.add(second);
        run(&mut world, 1);
        // Two bullets of 10 damage against 20 health
        assert!(world.get(enemy).is_none());
        assert_eq!(world.count_tagged(&TypeTag::PLAYER_BULLET), 0);
    }

    #[test]
    fn test_enemy_bullets_ignore_enemies() {
        let mut world = world();
        let template = Rc::new(BulletTemplate {
            speed: 0.0,
            ..BulletTemplate::new(false)
        });
        let enemy = world.add(Creature::enemy().into_entity(Vec2::new(300.0, 300.0), 40.0).unwrap());
        world.add(Bullet::fire(&template, Vec2::new(300.0, 300.0), Vec2::X, 0.0).unwrap());
        run(&mut world, 1);
        let creature = world.get(enemy).and_then(|e| e.behavior::<Creature>()).unwrap();
        assert_eq!(creature.health(), creature.max_health);
        assert_eq!(world.count_tagged(&TypeTag::ENEMY_BULLET), 1);
    }

    #[test]
    fn test_bullet_knocks_out_terrain_and_dies() {
        let mut world = world();
        let cell = IVec2::new(5, 5);
        world.field_mut().set_block(cell, BlockEdit::Set(1.0));
        let template = Rc::new(BulletTemplate::new(true));
        // Heading right into the cell spanning x 300..360
        world.add(Bullet::fire(&template, Vec2::new(280.0, 330.0), Vec2::X, 0.0).unwrap());
        run(&mut world, 1);
        assert!(!world.field().is_solid(cell));
        assert_eq!(world.field().blocks_destroyed_by_player(), 1);
        assert_eq!(world.count_tagged(&TypeTag::PLAYER_BULLET), 0);
        assert!(world.count_tagged(&TypeTag::PARTICLE) > 0);
    }

    #[test]
    fn test_hooks_run_on_hit_and_destroy() {
        thread_local! {
            static HITS: Cell<f32> = const { Cell::new(0.0) };
            static DESTROYS: Cell<f32> = const { Cell::new(0.0) };
        }
        fn on_hit(_: &Bullet, target: &mut Entity, data: f32, _: &mut TickContext<'_>) {
            assert_eq!(target.tag, TypeTag::ENEMY);
            HITS.with(|h| h.set(h.get() + data));
        }
        fn on_destroy(_: &Bullet, _: &Body, data: f32, _: &mut TickContext<'_>) {
            DESTROYS.with(|d| d.set(d.get() + data));
        }

        let mut template = BulletTemplate {
            speed: 0.0,
            ..BulletTemplate::new(true)
        };
        template.on_hit.push("test", 2.0, Rc::new(on_hit));
        template.on_destroy.push("test", 5.0, Rc::new(on_destroy));
        let template = Rc::new(template);

        let mut world = world();
        world.add(Creature::enemy().into_entity(Vec2::new(300.0, 300.0), 40.0).unwrap());
        world.add(Bullet::fire(&template, Vec2::new(300.0, 300.0), Vec2::X, 0.0).unwrap());
        run(&mut world, 1);
        assert_eq!(HITS.with(Cell::get), 2.0);
        assert_eq!(DESTROYS.with(Cell::get), 5.0);
    }
}
