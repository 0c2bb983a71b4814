//! Destructible terrain grid
//!
//! One cell per world tile, row-major. Cells are created once from the
//! generated level and afterwards only change through `set_block` and
//! `destroy_block`.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, Rect};
use crate::error::SimError;

/// Durability at or below which a cell is passable
pub const DESTROY_THRESHOLD: f32 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Durability {
    Finite(f32),
    Indestructible,
}

impl Durability {
    pub const EMPTY: Durability = Durability::Finite(0.0);

    #[inline]
    pub fn is_solid(&self) -> bool {
        match self {
            Durability::Finite(d) => *d > DESTROY_THRESHOLD,
            Durability::Indestructible => true,
        }
    }
}

/// A single terrain cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub durability: Durability,
    /// Palette index for rendering; no effect on physics
    pub decor: Option<u32>,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        durability: Durability::EMPTY,
        decor: None,
    };
}

/// Durability change requested by `set_block`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockEdit {
    /// Add to the current durability (negative damages)
    Delta(f32),
    /// Replace the current durability
    Set(f32),
}

/// Inclusive rectangle of cells. Empty when `min` exceeds `max` on an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub min: IVec2,
    pub max: IVec2,
}

impl CellRange {
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            let span = self.max - self.min + IVec2::ONE;
            span.x as usize * span.y as usize
        }
    }

    /// Cells top-to-bottom, each row left-to-right
    pub fn iter(&self) -> impl Iterator<Item = IVec2> + use<> {
        let CellRange { min, max } = *self;
        (min.y..=max.y).flat_map(move |row| (min.x..=max.x).map(move |col| IVec2::new(col, row)))
    }
}

/// Grid of destructible terrain cells aligned with world tiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockField {
    cols: i32,
    rows: i32,
    cell_size: Vec2,
    cells: Vec<Cell>,
    destroyed_by_player: u32,
}

impl BlockField {
    /// Create an all-empty field
    pub fn new(cols: usize, rows: usize, cell_size: Vec2) -> Result<Self, SimError> {
        validate_cell_size(cell_size)?;
        if cols == 0 || rows == 0 {
            return Err(SimError::EmptyGrid);
        }
        Ok(Self {
            cols: cols as i32,
            rows: rows as i32,
            cell_size,
            cells: vec![Cell::EMPTY; cols * rows],
            destroyed_by_player: 0,
        })
    }

    /// Build from a generated terrain board (`board[row][col]`, true = solid)
    pub fn from_terrain(
        board: &[Vec<bool>],
        cell_size: Vec2,
        durability: Durability,
    ) -> Result<Self, SimError> {
        let durability = validate_durability(durability)?;
        let cols = board.first().map(Vec::len).unwrap_or(0);
        let mut field = Self::new(cols, board.len(), cell_size)?;
        for (row, line) in board.iter().enumerate() {
            if line.len() != cols {
                return Err(SimError::RaggedGrid {
                    row,
                    len: line.len(),
                    expected: cols,
                });
            }
            for (col, &solid) in line.iter().enumerate() {
                if solid {
                    field.cells[row * cols + col].durability = durability;
                }
            }
        }
        log::info!(
            "Block field {}x{} loaded, {} solid cells",
            field.cols,
            field.rows,
            field.cells.iter().filter(|c| c.durability.is_solid()).count()
        );
        Ok(field)
    }

    /// Make every solid cell on the outer border indestructible
    pub fn seal_border(&mut self) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let on_border = row == 0 || col == 0 || row == self.rows - 1 || col == self.cols - 1;
                let idx = (row * self.cols + col) as usize;
                if on_border && self.cells[idx].durability.is_solid() {
                    self.cells[idx].durability = Durability::Indestructible;
                }
            }
        }
    }

    #[inline]
    pub fn cols(&self) -> i32 {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> i32 {
        self.rows
    }

    #[inline]
    pub fn cell_size(&self) -> Vec2 {
        self.cell_size
    }

    /// World extent covered by the grid
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.cols as f32, self.rows as f32) * self.cell_size
    }

    #[inline]
    pub fn contains_cell(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.cols && cell.y < self.rows
    }

    /// True when a world position lies inside the grid
    pub fn in_bounds(&self, pos: Vec2) -> bool {
        let size = self.world_size();
        pos.x >= 0.0 && pos.y >= 0.0 && pos.x < size.x && pos.y < size.y
    }

    fn index(&self, cell: IVec2) -> Option<usize> {
        self.contains_cell(cell)
            .then(|| (cell.y * self.cols + cell.x) as usize)
    }

    pub fn cell(&self, cell: IVec2) -> Option<&Cell> {
        self.index(cell).map(|i| &self.cells[i])
    }

    pub fn durability(&self, cell: IVec2) -> Option<Durability> {
        self.cell(cell).map(|c| c.durability)
    }

    /// Solid cells block movement; cells outside the grid are not solid
    pub fn is_solid(&self, cell: IVec2) -> bool {
        self.cell(cell).is_some_and(|c| c.durability.is_solid())
    }

    pub fn set_decor(&mut self, cell: IVec2, decor: Option<u32>) {
        if let Some(i) = self.index(cell) {
            self.cells[i].decor = decor;
        }
    }

    /// Top-left corner of a cell in world space
    #[inline]
    pub fn cell_to_world_position(&self, cell: IVec2) -> Vec2 {
        cell.as_vec2() * self.cell_size
    }

    /// Center of a cell in world space
    #[inline]
    pub fn cell_center(&self, cell: IVec2) -> Vec2 {
        self.cell_to_world_position(cell) + self.cell_size * 0.5
    }

    /// Cell containing a world position (may lie outside the grid)
    #[inline]
    pub fn world_to_cell(&self, pos: Vec2) -> IVec2 {
        (pos / self.cell_size).floor().as_ivec2()
    }

    /// Collision rectangle of a cell
    pub fn cell_rect(&self, cell: IVec2) -> Rect {
        Rect {
            center: self.cell_center(cell),
            half: self.cell_size * 0.5,
        }
    }

    /// Every cell a bounding box overlaps, ignoring grid limits. Edges that
    /// land exactly on a cell boundary do not pull in the next cell.
    pub fn cell_range_unclamped(&self, bounds: Aabb) -> CellRange {
        let min = (bounds.min / self.cell_size).floor().as_ivec2();
        let max = (bounds.max / self.cell_size).ceil().as_ivec2() - IVec2::ONE;
        CellRange { min, max }
    }

    /// Broad-phase input for terrain: overlapped cells clipped to the grid
    pub fn cell_range_for_bounds(&self, bounds: Aabb) -> CellRange {
        let range = self.cell_range_unclamped(bounds);
        CellRange {
            min: range.min.max(IVec2::ZERO),
            max: range.max.min(IVec2::new(self.cols - 1, self.rows - 1)),
        }
    }

    /// Change a cell's durability, clamping at zero. Returns true only when
    /// the cell went from solid to passable; indestructible cells never change.
    pub fn set_block(&mut self, cell: IVec2, edit: BlockEdit) -> bool {
        let Some(i) = self.index(cell) else {
            return false;
        };
        let target = &mut self.cells[i];
        let Durability::Finite(current) = target.durability else {
            return false;
        };

        let next = match edit {
            BlockEdit::Delta(delta) => current + delta,
            BlockEdit::Set(value) => value,
        };
        if next.is_nan() {
            log::warn!("Ignoring NaN durability edit on cell {cell}");
            return false;
        }
        if next == f32::INFINITY {
            target.durability = Durability::Indestructible;
            return false;
        }

        let was_solid = current > DESTROY_THRESHOLD;
        let next = next.max(0.0);
        if was_solid && next <= DESTROY_THRESHOLD {
            target.durability = Durability::EMPTY;
            target.decor = None;
            log::debug!("Block {cell} destroyed");
            true
        } else {
            target.durability = Durability::Finite(next);
            false
        }
    }

    /// Knock a block out entirely
    pub fn destroy_block(&mut self, cell: IVec2, attributed_to_player: bool) -> bool {
        let destroyed = self.set_block(cell, BlockEdit::Set(0.0));
        if destroyed && attributed_to_player {
            self.destroyed_by_player += 1;
        }
        destroyed
    }

    /// Blocks the player has knocked out so far
    pub fn blocks_destroyed_by_player(&self) -> u32 {
        self.destroyed_by_player
    }

    /// Passable cells in scan order, for initial entity placement
    pub fn empty_cells(&self) -> Vec<IVec2> {
        CellRange {
            min: IVec2::ZERO,
            max: IVec2::new(self.cols - 1, self.rows - 1),
        }
        .iter()
        .filter(|&c| !self.is_solid(c))
        .collect()
    }
}

fn validate_cell_size(cell_size: Vec2) -> Result<(), SimError> {
    for value in [cell_size.x, cell_size.y] {
        if !value.is_finite() || value <= 0.0 {
            return Err(SimError::InvalidExtent {
                what: "cell size",
                value,
            });
        }
    }
    Ok(())
}

/// Durability is never negative; infinite durability means indestructible
fn validate_durability(durability: Durability) -> Result<Durability, SimError> {
    match durability {
        Durability::Finite(value) if value.is_nan() || value < 0.0 => Err(SimError::InvalidScalar {
            what: "durability",
            value,
        }),
        Durability::Finite(value) if value == f32::INFINITY => Ok(Durability::Indestructible),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn field() -> BlockField {
        let board = vec![
            vec![true, true, true, true],
            vec![true, false, false, true],
            vec![true, false, true, true],
            vec![true, true, true, true],
        ];
        BlockField::from_terrain(&board, Vec2::new(60.0, 60.0), Durability::Finite(3.0)).unwrap()
    }

    #[test]
    fn test_world_cell_mapping() {
        let f = field();
        assert_eq!(f.cell_to_world_position(IVec2::new(2, 1)), Vec2::new(120.0, 60.0));
        assert_eq!(f.world_to_cell(Vec2::new(119.9, 60.0)), IVec2::new(1, 1));
        assert_eq!(f.world_to_cell(Vec2::new(-0.5, 10.0)), IVec2::new(-1, 0));
        assert_eq!(f.cell_center(IVec2::ZERO), Vec2::new(30.0, 30.0));
    }

    #[test]
    fn test_cell_range_for_bounds() {
        let f = field();
        let range = f.cell_range_for_bounds(Aabb {
            min: Vec2::new(50.0, 50.0),
            max: Vec2::new(120.0, 70.0),
        });
        // Right edge on the boundary at x=120 stays in column 1
        assert_eq!(range, CellRange { min: IVec2::new(0, 0), max: IVec2::new(1, 1) });
        assert_eq!(
            range.iter().collect::<Vec<_>>(),
            vec![IVec2::new(0, 0), IVec2::new(1, 0), IVec2::new(0, 1), IVec2::new(1, 1)]
        );
    }

    #[test]
    fn test_cell_range_clamps_and_empties() {
        let f = field();
        let outside = f.cell_range_for_bounds(Aabb {
            min: Vec2::new(-500.0, -500.0),
            max: Vec2::new(-400.0, -400.0),
        });
        assert!(outside.is_empty());
        assert_eq!(outside.len(), 0);
        assert_eq!(outside.iter().count(), 0);

        // Zero-area box on a cell corner covers nothing
        let point = f.cell_range_for_bounds(Aabb {
            min: Vec2::new(60.0, 60.0),
            max: Vec2::new(60.0, 60.0),
        });
        assert!(point.is_empty());

        // Zero-area box inside a cell covers that cell
        let inner = f.cell_range_for_bounds(Aabb {
            min: Vec2::new(70.0, 70.0),
            max: Vec2::new(70.0, 70.0),
        });
        assert_eq!(inner.iter().collect::<Vec<_>>(), vec![IVec2::new(1, 1)]);
    }

    #[test]
    fn test_set_block_clamps_and_reports_once() {
        let mut f = field();
        let cell = IVec2::new(2, 2);
        assert_eq!(f.durability(cell), Some(Durability::Finite(3.0)));
        assert!(f.set_block(cell, BlockEdit::Delta(-5.0)));
        assert_eq!(f.durability(cell), Some(Durability::Finite(0.0)));
        assert!(!f.set_block(cell, BlockEdit::Delta(-5.0)));
        assert_eq!(f.durability(cell), Some(Durability::Finite(0.0)));
        assert!(!f.is_solid(cell));
    }

    #[test]
    fn test_partial_damage_keeps_block() {
        let mut f = field();
        let cell = IVec2::new(2, 2);
        assert!(!f.set_block(cell, BlockEdit::Delta(-1.0)));
        assert_eq!(f.durability(cell), Some(Durability::Finite(2.0)));
        assert!(!f.set_block(cell, BlockEdit::Delta(f32::NAN)));
        assert_eq!(f.durability(cell), Some(Durability::Finite(2.0)));
    }

    #[test]
    fn test_destroy_block_is_idempotent() {
        let mut f = field();
        let cell = IVec2::new(2, 2);
        f.set_decor(cell, Some(4));
        assert!(f.destroy_block(cell, true));
        assert_eq!(f.cell(cell).unwrap().decor, None);
        for _ in 0..3 {
            assert!(!f.destroy_block(cell, true));
            assert_eq!(f.durability(cell), Some(Durability::EMPTY));
        }
        assert_eq!(f.blocks_destroyed_by_player(), 1);
        // Empty from the start
        assert!(!f.destroy_block(IVec2::new(1, 1), false));
        // Outside the grid
        assert!(!f.destroy_block(IVec2::new(10, 10), true));
    }

    #[test]
    fn test_indestructible_never_changes() {
        let mut f = field();
        f.seal_border();
        let corner = IVec2::ZERO;
        for _ in 0..2 {
            assert!(!f.destroy_block(corner, true));
            assert!(!f.set_block(corner, BlockEdit::Delta(-100.0)));
            assert_eq!(f.durability(corner), Some(Durability::Indestructible));
        }
        // Interior solid cell stays destructible
        assert_eq!(f.durability(IVec2::new(2, 2)), Some(Durability::Finite(3.0)));
    }

    #[test]
    fn test_refill_empty_cell() {
        let mut f = field();
        let cell = IVec2::new(1, 1);
        assert!(!f.set_block(cell, BlockEdit::Set(2.0)));
        assert!(f.is_solid(cell));
        assert!(!f.set_block(cell, BlockEdit::Set(f32::INFINITY)));
        assert_eq!(f.durability(cell), Some(Durability::Indestructible));
    }

    #[test]
    fn test_empty_cells_and_bounds() {
        let f = field();
        assert_eq!(f.empty_cells(), vec![IVec2::new(1, 1), IVec2::new(2, 1), IVec2::new(1, 2)]);
        assert!(f.in_bounds(Vec2::new(239.0, 0.0)));
        assert!(!f.in_bounds(Vec2::new(240.0, 10.0)));
        assert_eq!(f.world_size(), Vec2::new(240.0, 240.0));
    }

    #[test]
    fn test_malformed_grid_rejected() {
        let size = Vec2::new(60.0, 60.0);
        assert_eq!(
            BlockField::from_terrain(&[], size, Durability::Finite(1.0)).unwrap_err(),
            SimError::EmptyGrid
        );
        let ragged = vec![vec![true, true], vec![true]];
        assert!(matches!(
            BlockField::from_terrain(&ragged, size, Durability::Finite(1.0)),
            Err(SimError::RaggedGrid { row: 1, len: 1, expected: 2 })
        ));
        assert!(BlockField::new(2, 2, Vec2::new(0.0, 60.0)).is_err());
        assert!(BlockField::new(2, 2, Vec2::new(f32::NAN, 60.0)).is_err());
    }

    #[test]
    fn test_bad_durability_rejected() {
        let board = vec![vec![true, false]];
        let size = Vec2::new(60.0, 60.0);
        assert!(matches!(
            BlockField::from_terrain(&board, size, Durability::Finite(-3.0)),
            Err(SimError::InvalidScalar { what: "durability", .. })
        ));
        assert!(BlockField::from_terrain(&board, size, Durability::Finite(f32::NAN)).is_err());

        let field = BlockField::from_terrain(&board, size, Durability::Finite(f32::INFINITY)).unwrap();
        assert_eq!(field.durability(IVec2::ZERO), Some(Durability::Indestructible));
        assert_eq!(field.durability(IVec2::new(1, 0)), Some(Durability::EMPTY));
    }

    proptest! {
        #[test]
        fn prop_cell_world_inverse(col in -200i32..200, row in -200i32..200, w in 1u32..128, h in 1u32..128) {
            let f = BlockField::new(4, 4, Vec2::new(w as f32, h as f32)).unwrap();
            let cell = IVec2::new(col, row);
            prop_assert_eq!(f.world_to_cell(f.cell_to_world_position(cell)), cell);
        }
    }
}
