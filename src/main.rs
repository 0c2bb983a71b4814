//! Cave Crawl headless runner
//!
//! Builds a sealed demo cave, drops in the hero, enemies and pickups, then
//! drives the simulation with scripted input on a fixed timestep.
//!
//! Usage: `cave-crawl [settings.json] [frames]`

use std::path::PathBuf;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use cave_crawl::consts::*;
use cave_crawl::game::{self, Creature, HERO_LANDMARK};
use cave_crawl::sim::{BlockField, Button, DrawList, Durability, InputState, TickStats, TypeTag, World, tick};
use cave_crawl::{SimError, Settings};

const CAVE_COLS: usize = 64;
const CAVE_ROWS: usize = 48;
const FILL_CHANCE: f64 = 0.45;
const SMOOTHING_PASSES: usize = 4;
const DEFAULT_FRAMES: u32 = 1200;
/// Rendered frames run at 30 Hz so each one covers two ticks
const FRAME_DT: f32 = 1.0 / 30.0;

/// Cellular-automaton cave: random fill, then majority smoothing
fn generate_cave(seed: u64) -> Vec<Vec<bool>> {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut board: Vec<Vec<bool>> = (0..CAVE_ROWS)
        .map(|_| (0..CAVE_COLS).map(|_| rng.random_bool(FILL_CHANCE)).collect())
        .collect();

    for _ in 0..SMOOTHING_PASSES {
        let prev = board.clone();
        for (row, line) in board.iter_mut().enumerate() {
            for (col, cell) in line.iter_mut().enumerate() {
                let mut walls = 0;
                for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        let (r, c) = (row as i32 + dy, col as i32 + dx);
                        let outside = r < 0 || c < 0 || r >= CAVE_ROWS as i32 || c >= CAVE_COLS as i32;
                        if outside || prev[r as usize][c as usize] {
                            walls += 1;
                        }
                    }
                }
                *cell = walls >= 5;
            }
        }
    }

    // Solid rim so nothing leaves the cave
    for (row, line) in board.iter_mut().enumerate() {
        for (col, cell) in line.iter_mut().enumerate() {
            if row == 0 || col == 0 || row == CAVE_ROWS - 1 || col == CAVE_COLS - 1 {
                *cell = true;
            }
        }
    }
    board
}

fn build_world(settings: &Settings) -> Result<World, SimError> {
    let board = generate_cave(settings.seed);
    let cell_size = Vec2::new(settings.block_width, settings.block_height);
    let mut field = BlockField::from_terrain(&board, cell_size, Durability::Finite(BLOCK_DURABILITY))?;
    field.seal_border();
    let mut world = World::new(field, settings);

    if game::spawn_hero(&mut world).is_none() {
        log::warn!("Cave has no open cells for the hero");
    }
    game::populate_level(&mut world, 12, 6, 400.0);
    Ok(world)
}

/// Scripted input: wander in a slow square, shoot ahead, bomb now and then
fn script_input(input: &mut InputState, frame: u32) {
    const MOVES: [Button; 4] = [Button::Right, Button::Down, Button::Left, Button::Up];
    const SHOTS: [Button; 4] = [Button::ShootRight, Button::ShootDown, Button::ShootLeft, Button::ShootUp];

    let phase = (frame / 90) as usize % 4;
    for (i, (&mv, &shot)) in MOVES.iter().zip(&SHOTS).enumerate() {
        if i == phase {
            input.press(mv);
            input.press(shot);
        } else {
            input.release(mv);
            input.release(shot);
        }
    }
    if frame % 240 == 120 {
        input.press(Button::Bomb);
    } else {
        input.release(Button::Bomb);
    }
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let settings_path = args.next().map(PathBuf::from);
    let frames = args.next().and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_FRAMES);
    let settings = Settings::load_or_default(settings_path.as_deref());

    log::info!("Cave Crawl (headless) starting, seed {}", settings.seed);
    let mut world = match build_world(&settings) {
        Ok(world) => world,
        Err(e) => {
            log::error!("Could not build the cave: {e}");
            std::process::exit(1);
        }
    };

    let mut input = InputState::new();
    let mut canvas = DrawList::new();
    let mut totals = TickStats::default();
    let mut accumulator = 0.0;
    let mut ticks = 0u32;

    for frame in 0..frames {
        script_input(&mut input, frame);
        accumulator += FRAME_DT;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < settings.max_substeps {
            canvas.clear();
            let stats = tick(&mut world, &input, &mut canvas);
            totals.block_contacts += stats.block_contacts;
            totals.reactions += stats.reactions;
            totals.removed += stats.removed;
            accumulator -= SIM_DT;
            substeps += 1;
            ticks += 1;
            // Presses only count for the first tick that sees them
            input.end_tick();
        }

        if world.landmark(HERO_LANDMARK).and_then(|id| world.get(id)).is_none() {
            log::info!("Hero died on frame {frame}");
            break;
        }
        if frame % 300 == 0 {
            log::debug!(
                "Frame {frame}: {} entities, {} draw commands",
                world.len(),
                canvas.len()
            );
        }
    }

    let hero = world
        .landmark(HERO_LANDMARK)
        .and_then(|id| world.get(id))
        .and_then(|e| e.behavior::<Creature>());
    log::info!(
        "Ran {ticks} ticks: {} block contacts, {} reactions, {} removed",
        totals.block_contacts,
        totals.reactions,
        totals.removed
    );
    log::info!(
        "Enemies left: {}, blocks destroyed by player: {}",
        world.count_tagged(&TypeTag::ENEMY),
        world.field().blocks_destroyed_by_player()
    );
    match hero {
        Some(hero) => log::info!("Hero health {:.1}/{:.1}, bombs {}", hero.health(), hero.max_health, hero.bombs()),
        None => log::info!("Hero did not survive"),
    }
}
