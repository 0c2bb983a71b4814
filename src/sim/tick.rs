//! Fixed-order simulation tick
//!
//! One tick is a sequence of complete passes over the live entities:
//! action, step, terrain adjust, entity collision, draw, sweep. Spawns are
//! admitted between passes; entities admitted this tick sit out the adjust
//! and collision passes until the next one.

use std::collections::HashMap;

use glam::IVec2;

use super::adjust::adjust_entity;
use super::block_field::{BlockField, CellRange};
use super::canvas::Canvas;
use super::collision::{Shape, test_overlap};
use super::entity::Entity;
use super::input::InputState;
use super::world::World;

/// Counters for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub block_contacts: usize,
    pub reactions: usize,
    pub removed: usize,
}

/// Advance the world by one tick
pub fn tick(world: &mut World, input: &InputState, canvas: &mut dyn Canvas) -> TickStats {
    world.begin_tick();

    action_pass(world, input);
    world.flush_spawns();

    step_pass(world);
    world.follow_camera();

    let block_contacts = adjust_pass(world, input);
    world.flush_spawns();

    let reactions = collision_pass(world, input);
    world.flush_spawns();

    draw_pass(world, canvas);

    let removed = world.sweep(input);
    world.flush_spawns();

    TickStats {
        block_contacts,
        reactions,
        removed,
    }
}

fn action_pass(world: &mut World, input: &InputState) {
    let (entities, mut ctx) = world.split(input);
    for entity in entities.iter_mut() {
        entity.action(&mut ctx);
    }
}

fn step_pass(world: &mut World) {
    for entity in world.entities_mut() {
        entity.step();
    }
}

fn adjust_pass(world: &mut World, input: &InputState) -> usize {
    let frame = world.frame();
    let (entities, mut ctx) = world.split(input);
    let mut contacts = 0;
    for entity in entities.iter_mut().filter(|e| e.spawned_tick() < frame) {
        for cell in adjust_entity(&mut entity.body, ctx.field) {
            entity.collide_with_block(cell, &mut ctx);
            contacts += 1;
        }
    }
    contacts
}

fn collision_pass(world: &mut World, input: &InputState) -> usize {
    let frame = world.frame();
    let (entities, mut ctx) = world.split(input);
    let pairs = candidate_pairs(entities, frame, ctx.field);
    let mut reactions = 0;

    for (i, j) in pairs {
        let (a, b) = pair_mut(entities, i, j);
        let a_reacts = a.reactions.reacts_to(&b.tag);
        let b_reacts = b.reactions.reacts_to(&a.tag);
        if !a_reacts && !b_reacts {
            continue;
        }
        if test_overlap(&a.body.entity_shape(), &b.body.entity_shape()).is_none() {
            continue;
        }
        if a_reacts && a.react(b, &mut ctx) {
            reactions += 1;
        }
        if b_reacts && b.react(a, &mut ctx) {
            reactions += 1;
        }
    }
    reactions
}

fn draw_pass(world: &World, canvas: &mut dyn Canvas) {
    for entity in world.entities() {
        entity.draw(canvas);
    }
}

/// Broad-phase: bucket entities by the grid cells their entity hitbox
/// covers, then pair up bucket members. Sorted, without duplicates.
fn candidate_pairs(entities: &[Entity], frame: u64, field: &BlockField) -> Vec<(usize, usize)> {
    let mut buckets: HashMap<IVec2, Vec<usize>> = HashMap::new();
    for (i, entity) in entities.iter().enumerate() {
        if entity.spawned_tick() >= frame {
            continue;
        }
        for cell in bucket_range(&entity.body.entity_shape(), field).iter() {
            buckets.entry(cell).or_default().push(i);
        }
    }

    let mut pairs = Vec::new();
    for members in buckets.values() {
        for (n, &i) in members.iter().enumerate() {
            for &j in &members[n + 1..] {
                pairs.push((i, j));
            }
        }
    }
    pairs.sort_unstable();
    pairs.dedup();
    pairs
}

/// Buckets a hitbox falls into. Cells past the grid edge collapse onto a
/// one-cell ring around it, so the count is bounded by the grid size.
fn bucket_range(shape: &Shape, field: &BlockField) -> CellRange {
    let mut range = field.cell_range_unclamped(shape.bounds());
    if range.is_empty() {
        // Zero-size hitboxes still live in one cell
        let cell = field.world_to_cell(shape.center());
        range = CellRange {
            min: cell,
            max: cell,
        };
    }
    let lo = IVec2::NEG_ONE;
    let hi = IVec2::new(field.cols(), field.rows());
    CellRange {
        min: range.min.clamp(lo, hi),
        max: range.max.clamp(lo, hi),
    }
}

/// Two distinct entities borrowed mutably; `i < j`
fn pair_mut(entities: &mut [Entity], i: usize, j: usize) -> (&mut Entity, &mut Entity) {
    debug_assert!(i < j);
    let (head, tail) = entities.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}
