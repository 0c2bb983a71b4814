//! Terrain adjustment
//!
//! Pushes an entity out of solid cells in a single pass. Each overlapped
//! cell proposes its shallowest exit through a face that opens onto
//! passable space, or through any allowed face when it has none open;
//! proposals are combined per axis, so the result does not depend on the
//! order cells are scanned.

use glam::{IVec2, Vec2};

use super::block_field::BlockField;
use super::collision::{Aabb, Shape, reflect_velocity, test_overlap};
use super::entity::{Body, Sides};

/// Resolve `body` against the terrain. Returns every overlapped solid
/// cell in scan order (top-to-bottom, left-to-right).
pub fn adjust_entity(body: &mut Body, field: &BlockField) -> Vec<IVec2> {
    let shape = body.terrain_shape();
    let bounds = shape.bounds();
    let mut contacts = Vec::new();
    let mut push = AxisPush::default();

    for cell in field.cell_range_for_bounds(bounds).iter() {
        if !field.is_solid(cell) {
            continue;
        }
        let rect = field.cell_rect(cell);
        if test_overlap(&shape, &Shape::Rect(rect)).is_none() {
            continue;
        }
        contacts.push(cell);
        if body.hits_walls {
            if let Some(exit) = exit_push(&bounds, &rect.aabb(), cell, field, body.collides) {
                push.add(exit);
            }
        }
    }

    let offset = push.resolve();
    if offset != Vec2::ZERO {
        body.pos += offset;
        let restitution = if body.bounciness > 0.0 {
            body.rubberiness
        } else {
            0.0
        };
        if offset.x != 0.0 && body.vel.x * offset.x < 0.0 {
            body.vel = reflect_velocity(body.vel, Vec2::new(offset.x.signum(), 0.0), restitution);
        }
        if offset.y != 0.0 && body.vel.y * offset.y < 0.0 {
            body.vel = reflect_velocity(body.vel, Vec2::new(0.0, offset.y.signum()), restitution);
        }
    }
    contacts
}

/// Shallowest allowed push that moves `entity` out of `cell`, preferring
/// exposed faces. A cell buried in terrain falls back to its shallowest
/// allowed face. Ties go -x, +x, -y, +y.
fn exit_push(entity: &Aabb, cell_box: &Aabb, cell: IVec2, field: &BlockField, sides: Sides) -> Option<Vec2> {
    // A push toward -x means the block is on the entity's right side
    let candidates = [
        (sides.right, IVec2::NEG_X, Vec2::new(cell_box.min.x - entity.max.x, 0.0)),
        (sides.left, IVec2::X, Vec2::new(cell_box.max.x - entity.min.x, 0.0)),
        (sides.bottom, IVec2::NEG_Y, Vec2::new(0.0, cell_box.min.y - entity.max.y)),
        (sides.top, IVec2::Y, Vec2::new(0.0, cell_box.max.y - entity.min.y)),
    ];
    let shallowest = |exposed_only: bool| {
        candidates
            .into_iter()
            .filter(|&(allowed, dir, _)| allowed && (!exposed_only || face_exposed(field, cell + dir)))
            .map(|(_, _, push)| push)
            .filter(|push| *push != Vec2::ZERO)
            .min_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
    };
    shallowest(true).or_else(|| shallowest(false))
}

/// Neighbors outside the grid count as solid
fn face_exposed(field: &BlockField, neighbor: IVec2) -> bool {
    field.contains_cell(neighbor) && !field.is_solid(neighbor)
}

/// Largest push seen in each direction of each axis
#[derive(Debug, Default)]
struct AxisPush {
    negative: Vec2,
    positive: Vec2,
}

impl AxisPush {
    fn add(&mut self, push: Vec2) {
        self.negative = self.negative.min(push);
        self.positive = self.positive.max(push);
    }

    fn resolve(&self) -> Vec2 {
        self.negative + self.positive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::block_field::{BlockEdit, Durability};

    const CELL: f32 = 10.0;

    fn field(board: &[&str]) -> BlockField {
        let grid: Vec<Vec<bool>> = board
            .iter()
            .map(|row| row.chars().map(|c| c == '#').collect())
            .collect();
        BlockField::from_terrain(&grid, Vec2::splat(CELL), Durability::Finite(1.0)).unwrap()
    }

    fn ball(pos: Vec2, vel: Vec2) -> Body {
        Body {
            vel,
            bounciness: 1.0,
            rubberiness: 1.0,
            ..Body::sized(pos, 8.0, 8.0)
        }
    }

    #[test]
    fn test_bounce_off_wall_to_the_right() {
        let field = field(&["....", "..#.", "...."]);
        // Cell (2,1) spans x 20..30; ball edge at 22 after moving right
        let mut body = ball(Vec2::new(18.0, 15.0), Vec2::new(5.0, 0.0));
        let contacts = adjust_entity(&mut body, &field);
        assert_eq!(contacts, vec![IVec2::new(2, 1)]);
        assert_eq!(body.vel, Vec2::new(-5.0, 0.0));
        assert!((body.pos.x - 16.0).abs() < 1e-4);
        assert!(body.pos.x < 20.0);
    }

    #[test]
    fn test_no_bounciness_zeroes_velocity() {
        let field = field(&["....", "..#.", "...."]);
        let mut body = Body {
            bounciness: 0.0,
            ..ball(Vec2::new(18.0, 15.0), Vec2::new(5.0, 3.0))
        };
        adjust_entity(&mut body, &field);
        assert_eq!(body.vel, Vec2::new(0.0, 3.0));
    }

    #[test]
    fn test_moving_away_keeps_velocity() {
        let field = field(&["....", "..#.", "...."]);
        let mut body = ball(Vec2::new(18.0, 15.0), Vec2::new(-2.0, 0.0));
        adjust_entity(&mut body, &field);
        assert_eq!(body.vel, Vec2::new(-2.0, 0.0));
        assert!(body.pos.x < 18.0);
    }

    #[test]
    fn test_floor_seam_does_not_snag() {
        // Resting across two floor cells: only the upward push applies
        let field = field(&["....", "....", "####"]);
        let mut body = Body::sized(Vec2::new(20.0, 17.0), 8.0, 8.0);
        body.vel = Vec2::new(3.0, 1.0);
        let contacts = adjust_entity(&mut body, &field);
        assert_eq!(contacts, vec![IVec2::new(1, 2), IVec2::new(2, 2)]);
        assert!((body.pos - Vec2::new(20.0, 16.0)).length() < 1e-4);
        assert_eq!(body.vel, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn test_corner_pushes_both_axes() {
        let field = field(&["...#", "...#", "####"]);
        let mut body = Body::sized(Vec2::new(27.0, 17.0), 8.0, 8.0);
        adjust_entity(&mut body, &field);
        assert!((body.pos - Vec2::new(26.0, 16.0)).length() < 1e-4);
    }

    #[test]
    fn test_result_is_independent_of_cell_order() {
        let a = field(&["....", "##..", "##.."]);
        let mut body = Body::sized(Vec2::new(21.0, 14.0), 6.0, 6.0);
        let mut mirrored = body.clone();
        adjust_entity(&mut body, &a);
        // Same layout rebuilt through edits in reverse order
        let mut b = field(&["....", "....", "...."]);
        for cell in [IVec2::new(1, 2), IVec2::new(0, 2), IVec2::new(1, 1), IVec2::new(0, 1)] {
            b.set_block(cell, BlockEdit::Set(1.0));
        }
        adjust_entity(&mut mirrored, &b);
        assert_eq!(body.pos, mirrored.pos);
    }

    #[test]
    fn test_buried_in_thick_wall_is_still_pushed() {
        // Cell (4,1) has solid neighbors on every side
        let field = field(&["..####.", "..####.", "..####."]);
        let mut body = Body::sized(Vec2::new(45.0, 15.0), 4.0, 4.0);
        body.vel = Vec2::new(20.0, 0.0);
        let contacts = adjust_entity(&mut body, &field);
        assert_eq!(contacts, vec![IVec2::new(4, 1)]);
        // All four faces are 7 deep; -x wins the tie
        assert!((body.pos - Vec2::new(38.0, 15.0)).length() < 1e-4);
        assert_eq!(body.vel, Vec2::ZERO);
    }

    #[test]
    fn test_buried_cell_respects_side_flags() {
        let field = field(&["..####.", "..####.", "..####."]);
        let mut body = Body {
            collides: Sides::NONE,
            ..Body::sized(Vec2::new(45.0, 15.0), 4.0, 4.0)
        };
        adjust_entity(&mut body, &field);
        assert_eq!(body.pos, Vec2::new(45.0, 15.0));
    }

    #[test]
    fn test_side_flags_disable_pushes() {
        let field = field(&["....", "..#.", "...."]);
        let mut body = Body {
            collides: Sides {
                right: false,
                ..Sides::ALL
            },
            ..ball(Vec2::new(18.0, 15.0), Vec2::new(5.0, 0.0))
        };
        let start = body.pos;
        let contacts = adjust_entity(&mut body, &field);
        assert_eq!(contacts.len(), 1);
        // The remaining faces are deeper but still allowed
        assert_ne!(body.pos, start);
        assert_eq!(body.pos.x, start.x);
    }

    #[test]
    fn test_ghost_reports_contacts_without_pushing() {
        let field = field(&["....", "..#.", "...."]);
        let mut body = Body {
            hits_walls: false,
            ..ball(Vec2::new(18.0, 15.0), Vec2::new(5.0, 0.0))
        };
        let contacts = adjust_entity(&mut body, &field);
        assert_eq!(contacts, vec![IVec2::new(2, 1)]);
        assert_eq!(body.pos, Vec2::new(18.0, 15.0));
        assert_eq!(body.vel, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_terrain_hitbox_scalar_applies() {
        let field = field(&["....", "..#.", "...."]);
        let mut body = Body {
            block_hitbox_scalar: 0.25,
            ..ball(Vec2::new(18.0, 15.0), Vec2::new(5.0, 0.0))
        };
        assert!(adjust_entity(&mut body, &field).is_empty());
        assert_eq!(body.pos, Vec2::new(18.0, 15.0));
    }
}
