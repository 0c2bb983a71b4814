//! World state: live entities, terrain, camera, RNG
//!
//! Entities live in a dense `Vec` ordered by id. Spawns made during a pass
//! wait in a queue and are appended when the pass ends; removal happens only
//! in `sweep`.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::SeedableRng;
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::block_field::BlockField;
use super::collision::{Rect, Shape};
use super::entity::{Entity, EntityId, TypeTag};
use super::input::InputState;
use crate::settings::Settings;

/// Viewport over the world. `offset` maps world to screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub offset: Vec2,
    pub screen: Vec2,
}

impl Camera {
    pub fn new(screen: Vec2) -> Self {
        Self {
            offset: Vec2::ZERO,
            screen,
        }
    }

    /// Center the view on `target`
    pub fn follow(&mut self, target: Vec2) {
        self.offset = self.screen * 0.5 - target;
    }

    /// World position at the middle of the screen
    pub fn view_center(&self) -> Vec2 {
        self.screen * 0.5 - self.offset
    }

    /// Screen-sized rectangle used for visibility checks
    pub fn view_shape(&self) -> Shape {
        Shape::Rect(Rect {
            center: self.view_center(),
            half: self.screen * 0.5,
        })
    }

    #[inline]
    pub fn to_screen(&self, world: Vec2) -> Vec2 {
        world + self.offset
    }
}

/// What behaviors and reactions may touch during a pass
pub struct TickContext<'a> {
    pub field: &'a mut BlockField,
    pub rng: &'a mut Pcg32,
    pub input: &'a InputState,
    pub camera: Camera,
    pub frame: u64,
    landmarks: &'a BTreeMap<String, Vec2>,
    spawns: &'a mut Vec<Entity>,
    particles: usize,
    max_particles: usize,
}

impl TickContext<'_> {
    /// Queue an entity; it joins the world when the current pass ends
    pub fn spawn(&mut self, entity: Entity) {
        if entity.tag == TypeTag::PARTICLE {
            self.particles += 1;
        }
        self.spawns.push(entity);
    }

    /// Queue a particle unless the particle budget is spent
    pub fn spawn_particle(&mut self, entity: Entity) -> bool {
        if self.particles >= self.max_particles {
            return false;
        }
        self.spawn(entity);
        true
    }

    pub fn particle_room(&self) -> usize {
        self.max_particles.saturating_sub(self.particles)
    }

    /// Position of a named entity as of the start of this tick
    pub fn landmark(&self, name: &str) -> Option<Vec2> {
        self.landmarks.get(name).copied()
    }
}

/// The simulated world
#[derive(Debug)]
pub struct World {
    entities: Vec<Entity>,
    pending: Vec<Entity>,
    field: BlockField,
    rng: Pcg32,
    camera: Camera,
    camera_target: Option<EntityId>,
    landmarks: BTreeMap<String, EntityId>,
    landmark_positions: BTreeMap<String, Vec2>,
    frame: u64,
    next_id: u32,
    max_particles: usize,
}

impl World {
    pub fn new(field: BlockField, settings: &Settings) -> Self {
        log::info!(
            "World {}x{} cells, seed {}, particle budget {}",
            field.cols(),
            field.rows(),
            settings.seed,
            settings.max_particles()
        );
        Self {
            entities: Vec::new(),
            pending: Vec::new(),
            field,
            rng: Pcg32::seed_from_u64(settings.seed),
            camera: Camera::new(Vec2::new(settings.screen_width, settings.screen_height)),
            camera_target: None,
            landmarks: BTreeMap::new(),
            landmark_positions: BTreeMap::new(),
            frame: 0,
            next_id: 1,
            max_particles: settings.max_particles(),
        }
    }

    /// Register an entity immediately (outside a tick)
    pub fn add(&mut self, mut entity: Entity) -> EntityId {
        let id = self.allocate_id();
        entity.admit(id, self.frame);
        self.entities.push(entity);
        id
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        // Ids are assigned in append order, so the list stays sorted
        let i = self.entities.binary_search_by_key(&id, Entity::id).ok()?;
        self.entities.get(i)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let i = self.entities.binary_search_by_key(&id, Entity::id).ok()?;
        self.entities.get_mut(i)
    }

    pub fn count_tagged(&self, tag: &TypeTag) -> usize {
        self.entities.iter().filter(|e| &e.tag == tag).count()
    }

    pub fn field(&self) -> &BlockField {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut BlockField {
        &mut self.field
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn set_camera_target(&mut self, id: Option<EntityId>) {
        self.camera_target = id;
    }

    /// Completed tick count
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Name an entity so others can find it (e.g. "hero")
    pub fn set_landmark(&mut self, name: impl Into<String>, id: EntityId) {
        let name = name.into();
        if let Some(pos) = self.get(id).map(|e| e.body.pos) {
            self.landmark_positions.insert(name.clone(), pos);
        }
        self.landmarks.insert(name, id);
    }

    pub fn landmark(&self, name: &str) -> Option<EntityId> {
        self.landmarks.get(name).copied()
    }

    pub fn in_bounds(&self, pos: Vec2) -> bool {
        self.field.in_bounds(pos)
    }

    /// The world's seeded RNG, for level setup between ticks
    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Center of a random passable cell, for initial placement
    pub fn random_empty_position(&mut self) -> Option<Vec2> {
        let cells = self.field.empty_cells();
        let cell = *cells.choose(&mut self.rng)?;
        Some(self.field.cell_center(cell))
    }

    /// Drop every entity without running destroy hooks
    pub fn clear(&mut self) {
        log::debug!("Clearing {} entities", self.entities.len() + self.pending.len());
        self.entities.clear();
        self.pending.clear();
        self.landmarks.clear();
        self.landmark_positions.clear();
        self.camera_target = None;
    }

    /// Run `f` with a tick context outside the tick loop; spawns are
    /// admitted afterwards.
    pub fn scoped_context<R>(&mut self, input: &InputState, f: impl FnOnce(&mut TickContext<'_>) -> R) -> R {
        let (_, mut ctx) = self.split(input);
        let out = f(&mut ctx);
        self.flush_spawns();
        out
    }

    pub(crate) fn split<'a>(&'a mut self, input: &'a InputState) -> (&'a mut Vec<Entity>, TickContext<'a>) {
        let particles = self
            .entities
            .iter()
            .chain(&self.pending)
            .filter(|e| e.tag == TypeTag::PARTICLE)
            .count();
        let World {
            entities,
            pending,
            field,
            rng,
            camera,
            landmark_positions,
            frame,
            max_particles,
            ..
        } = self;
        let ctx = TickContext {
            field,
            rng,
            input,
            camera: *camera,
            frame: *frame,
            landmarks: landmark_positions,
            spawns: pending,
            particles,
            max_particles: *max_particles,
        };
        (entities, ctx)
    }

    pub(crate) fn begin_tick(&mut self) {
        self.frame += 1;
        self.landmarks.retain(|_, id| {
            self.entities
                .binary_search_by_key(id, Entity::id)
                .is_ok()
        });
        let positions = self
            .landmarks
            .iter()
            .filter_map(|(name, &id)| {
                let i = self.entities.binary_search_by_key(&id, Entity::id).ok()?;
                Some((name.clone(), self.entities[i].body.pos))
            })
            .collect();
        self.landmark_positions = positions;
    }

    /// Admit queued spawns in queue order
    pub(crate) fn flush_spawns(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let mut pending = std::mem::take(&mut self.pending);
        for mut entity in pending.drain(..) {
            let id = self.allocate_id();
            entity.admit(id, self.frame);
            self.entities.push(entity);
        }
        // Hand the allocation back for the next pass
        self.pending = pending;
    }

    pub(crate) fn follow_camera(&mut self) {
        let target = self.camera_target.and_then(|id| self.get(id)).map(|e| e.body.pos);
        if let Some(pos) = target {
            self.camera.follow(pos);
        }
    }

    /// Destroy flagged entities and remove them. Returns how many left.
    pub(crate) fn sweep(&mut self, input: &InputState) -> usize {
        let (entities, mut ctx) = self.split(input);
        for entity in entities.iter_mut().filter(|e| e.is_pending_delete()) {
            entity.destroy(&mut ctx);
        }
        let before = entities.len();
        entities.retain(|e| !e.is_destroyed());
        let removed = before - entities.len();
        if removed > 0 {
            log::trace!("Swept {removed} entities at frame {}", self.frame);
        }
        removed
    }
}
