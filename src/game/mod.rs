//! Gameplay layer
//!
//! Concrete entity types built only on the `sim` entity contract: they talk
//! to each other through tagged reactions and hook lists, never by type.

pub mod bomb;
pub mod bullet;
pub mod creature;
pub mod particle;
pub mod powerup;

pub use bomb::{BASIC_DAMAGE, Bomb, BombTemplate, basic_damage};
pub use bullet::{Bullet, BulletTemplate};
pub use creature::{Controller, Creature, defense_multiplier};
pub use particle::{Effect, Particle, ParticleSpec};
pub use powerup::{Pickup, PowerUp, PowerUpKind};

use rand::Rng;

use crate::sim::{EntityId, World};

/// Landmark name the hero registers under
pub const HERO_LANDMARK: &str = "hero";
pub const CREATURE_SIZE: f32 = 40.0;
const PLACEMENT_ATTEMPTS: usize = 50;

/// Spawn the hero in a random empty cell and point the camera at it
pub fn spawn_hero(world: &mut World) -> Option<EntityId> {
    let pos = world.random_empty_position()?;
    let entity = match Creature::hero().into_entity(pos, CREATURE_SIZE) {
        Ok(entity) => entity,
        Err(e) => {
            log::warn!("Hero not spawned: {e}");
            return None;
        }
    };
    let id = world.add(entity);
    world.set_landmark(HERO_LANDMARK, id);
    world.set_camera_target(Some(id));
    log::info!("Hero spawned at {pos}");
    Some(id)
}

/// Scatter enemies and pickups over empty cells, keeping `clearance` away
/// from the hero. Returns how many entities were placed.
pub fn populate_level(world: &mut World, enemies: usize, pickups: usize, clearance: f32) -> usize {
    let hero = world
        .landmark(HERO_LANDMARK)
        .and_then(|id| world.get(id))
        .map(|e| e.body.pos);
    let mut placed = 0;

    for n in 0..enemies + pickups {
        let Some(pos) = (0..PLACEMENT_ATTEMPTS)
            .filter_map(|_| world.random_empty_position())
            .find(|pos| hero.is_none_or(|h| h.distance(*pos) >= clearance))
        else {
            log::warn!("No room left after placing {placed} entities");
            break;
        };
        let entity = if n < enemies {
            Creature::enemy().into_entity(pos, CREATURE_SIZE)
        } else {
            let kind = match world.rng().random_range(0..3) {
                0 => PowerUpKind::HealthUp,
                1 => PowerUpKind::Nitroglycerin,
                _ => PowerUpKind::Xplode,
            };
            let magnitude = world.rng().random_range(1..=5);
            Pickup::entity(PowerUp::new(kind, magnitude), pos)
        };
        match entity {
            Ok(entity) => {
                world.add(entity);
                placed += 1;
            }
            Err(e) => log::warn!("Skipping placement at {pos}: {e}"),
        }
    }
    log::debug!("Populated level with {placed} entities");
    placed
}
