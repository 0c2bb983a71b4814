//! Collision detection and response for circles and axis-aligned rectangles
//!
//! Every entity presents one of two shapes. `test_overlap` doubles as the
//! "is colliding" predicate and as the data resolution consumes: the
//! minimum-translation vector that moves the first shape out of the second.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::vector::VectorExt;
use crate::error::SimError;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Strict interior overlap (shared edges do not count)
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }
}

/// Which shape an entity presents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    Circle,
    Rectangle,
}

impl ShapeKind {
    /// Square footprints are circles, anything else a rectangle
    pub fn derive(width: f32, height: f32) -> Self {
        if width == height {
            ShapeKind::Circle
        } else {
            ShapeKind::Rectangle
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Result<Self, SimError> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(SimError::InvalidExtent {
                what: "circle radius",
                value: radius,
            });
        }
        if !center.is_finite() {
            return Err(SimError::NonFinite {
                what: "circle center",
                x: center.x,
                y: center.y,
            });
        }
        Ok(Self { center, radius })
    }
}

/// Axis-aligned rectangle stored as center and half-extents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub center: Vec2,
    pub half: Vec2,
}

impl Rect {
    pub fn new(center: Vec2, half: Vec2) -> Result<Self, SimError> {
        for value in [half.x, half.y] {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::InvalidExtent {
                    what: "rectangle half-extent",
                    value,
                });
            }
        }
        if !center.is_finite() {
            return Err(SimError::NonFinite {
                what: "rectangle center",
                x: center.x,
                y: center.y,
            });
        }
        Ok(Self { center, half })
    }

    pub fn from_aabb(aabb: Aabb) -> Self {
        Self {
            center: aabb.center(),
            half: aabb.half_extents(),
        }
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.center, self.half)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Rect(Rect),
}

impl Shape {
    pub fn center(&self) -> Vec2 {
        match self {
            Shape::Circle(c) => c.center,
            Shape::Rect(r) => r.center,
        }
    }

    /// Bounding box used by every broad-phase
    pub fn bounds(&self) -> Aabb {
        match self {
            Shape::Circle(c) => Aabb::from_center(c.center, Vec2::splat(c.radius)),
            Shape::Rect(r) => r.aabb(),
        }
    }
}

/// Result of an overlap test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlap {
    /// Unit direction to push the first shape out of the second
    pub normal: Vec2,
    /// Penetration depth
    pub depth: f32,
    /// Minimum-translation vector (`normal * depth`)
    pub mtv: Vec2,
}

impl Overlap {
    fn new(normal: Vec2, depth: f32) -> Self {
        Self {
            normal,
            depth,
            mtv: normal * depth,
        }
    }

    fn flipped(self) -> Self {
        Self::new(-self.normal, self.depth)
    }
}

/// Test two shapes for overlap. `None` means no collision; touching
/// shapes do not overlap.
pub fn test_overlap(a: &Shape, b: &Shape) -> Option<Overlap> {
    match (a, b) {
        (Shape::Circle(a), Shape::Circle(b)) => circle_circle(a, b),
        (Shape::Rect(a), Shape::Rect(b)) => rect_rect(a, b),
        (Shape::Circle(a), Shape::Rect(b)) => circle_rect(a, b),
        (Shape::Rect(a), Shape::Circle(b)) => circle_rect(b, a).map(Overlap::flipped),
    }
}

/// Circle-circle: overlap iff center distance < radius sum. Coincident
/// centers push along +x.
pub fn circle_circle(a: &Circle, b: &Circle) -> Option<Overlap> {
    let delta = a.center - b.center;
    let radius_sum = a.radius + b.radius;
    let dist2 = delta.length_squared();
    if dist2 >= radius_sum * radius_sum {
        return None;
    }
    let dist = dist2.sqrt();
    let normal = if delta.is_zero_vec() { Vec2::X } else { delta.norm2() };
    Some(Overlap::new(normal, radius_sum - dist))
}

/// Rectangle-rectangle separating-axis test. The shallower axis wins;
/// equal depths resolve horizontally.
pub fn rect_rect(a: &Rect, b: &Rect) -> Option<Overlap> {
    let delta = a.center - b.center;
    let overlap_x = a.half.x + b.half.x - delta.x.abs();
    let overlap_y = a.half.y + b.half.y - delta.y.abs();
    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return None;
    }
    if overlap_x <= overlap_y {
        Some(Overlap::new(Vec2::new(axis_sign(delta.x), 0.0), overlap_x))
    } else {
        Some(Overlap::new(Vec2::new(0.0, axis_sign(delta.y)), overlap_y))
    }
}

/// Circle-rectangle: nearest point on the rectangle to the circle center.
/// A center inside the rectangle exits through the nearest face.
pub fn circle_rect(circle: &Circle, rect: &Rect) -> Option<Overlap> {
    let aabb = rect.aabb();
    let closest = circle.center.clamp(aabb.min, aabb.max);
    let delta = circle.center - closest;

    if !delta.is_zero_vec() {
        let dist2 = delta.length_squared();
        if dist2 >= circle.radius * circle.radius {
            return None;
        }
        return Some(Overlap::new(delta.norm2(), circle.radius - dist2.sqrt()));
    }

    // Center is inside (or on the boundary of) the rectangle
    let local = circle.center - rect.center;
    let to_face_x = rect.half.x - local.x.abs();
    let to_face_y = rect.half.y - local.y.abs();
    let depth_x = to_face_x + circle.radius;
    let depth_y = to_face_y + circle.radius;
    if depth_x <= 0.0 || depth_y <= 0.0 {
        // Zero-radius circle sitting exactly on an edge
        return None;
    }
    if depth_x <= depth_y {
        Some(Overlap::new(Vec2::new(axis_sign(local.x), 0.0), depth_x))
    } else {
        Some(Overlap::new(Vec2::new(0.0, axis_sign(local.y)), depth_y))
    }
}

#[inline]
fn axis_sign(v: f32) -> f32 {
    if v < 0.0 { -1.0 } else { 1.0 }
}

/// Reflect velocity off a surface, keeping `restitution` of the normal
/// component. 1.0 is a perfect mirror, 0.0 kills motion into the surface.
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2, restitution: f32) -> Vec2 {
    velocity - (1.0 + restitution) * velocity.dot(normal) * normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn circle(x: f32, y: f32, r: f32) -> Shape {
        Shape::Circle(Circle::new(Vec2::new(x, y), r).unwrap())
    }

    fn rect(x: f32, y: f32, hw: f32, hh: f32) -> Shape {
        Shape::Rect(Rect::new(Vec2::new(x, y), Vec2::new(hw, hh)).unwrap())
    }

    #[test]
    fn test_circles_apart_do_not_overlap() {
        assert!(test_overlap(&circle(0.0, 0.0, 1.0), &circle(3.5, 0.0, 2.0)).is_none());
        // Touching is not overlapping
        assert!(test_overlap(&circle(0.0, 0.0, 1.0), &circle(0.0, 2.0, 1.0)).is_none());
    }

    #[test]
    fn test_concentric_circles_push_along_x() {
        let hit = test_overlap(&circle(5.0, 5.0, 1.0), &circle(5.0, 5.0, 2.0)).unwrap();
        assert_eq!(hit.normal, Vec2::X);
        assert_eq!(hit.depth, 3.0);
        assert_eq!(hit.mtv, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn test_circle_mtv_points_away_from_other() {
        let hit = test_overlap(&circle(0.0, 0.0, 2.0), &circle(3.0, 0.0, 2.0)).unwrap();
        assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));
        assert!((hit.depth - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rect_rect_shallow_axis() {
        let hit = test_overlap(&rect(0.0, 0.0, 2.0, 2.0), &rect(3.5, 1.0, 2.0, 2.0)).unwrap();
        assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));
        assert!((hit.depth - 0.5).abs() < 1e-6);

        assert!(test_overlap(&rect(0.0, 0.0, 1.0, 1.0), &rect(2.0, 0.0, 1.0, 1.0)).is_none());
    }

    #[test]
    fn test_rect_rect_tie_prefers_horizontal() {
        let hit = test_overlap(&rect(0.0, 0.0, 1.0, 1.0), &rect(1.0, 1.0, 1.0, 1.0)).unwrap();
        assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));
        assert_eq!(hit.depth, 1.0);
    }

    #[test]
    fn test_circle_rect_corner() {
        // Circle near the corner of a unit square but outside the corner radius
        assert!(test_overlap(&circle(2.0, 2.0, 1.0), &rect(0.0, 0.0, 1.0, 1.0)).is_none());
        let hit = test_overlap(&circle(1.5, 1.5, 1.0), &rect(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert!(hit.normal.x > 0.0 && hit.normal.y > 0.0);
    }

    #[test]
    fn test_circle_inside_rect_exits_nearest_face() {
        let hit = test_overlap(&circle(0.0, 0.8, 0.5), &rect(0.0, 0.0, 2.0, 1.0)).unwrap();
        assert_eq!(hit.normal, Vec2::Y);
        assert!((hit.depth - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_rect_circle_is_flipped() {
        let a = test_overlap(&circle(1.8, 0.0, 0.5), &rect(0.0, 0.0, 1.5, 1.5)).unwrap();
        let b = test_overlap(&rect(0.0, 0.0, 1.5, 1.5), &circle(1.8, 0.0, 0.5)).unwrap();
        assert_eq!(a.normal, -b.normal);
        assert_eq!(a.depth, b.depth);
    }

    #[test]
    fn test_malformed_shapes_rejected() {
        assert!(Circle::new(Vec2::ZERO, -1.0).is_err());
        assert!(Circle::new(Vec2::ZERO, f32::NAN).is_err());
        assert!(Rect::new(Vec2::ZERO, Vec2::new(1.0, f32::NAN)).is_err());
        assert!(Rect::new(Vec2::new(f32::INFINITY, 0.0), Vec2::ONE).is_err());
    }

    #[test]
    fn test_reflect_velocity() {
        // Ball moving right, hits vertical wall (normal pointing left)
        let reflected = reflect_velocity(Vec2::new(100.0, 5.0), Vec2::new(-1.0, 0.0), 1.0);
        assert!((reflected.x - (-100.0)).abs() < 0.001);
        assert!((reflected.y - 5.0).abs() < 0.001);

        let absorbed = reflect_velocity(Vec2::new(100.0, 5.0), Vec2::new(-1.0, 0.0), 0.0);
        assert!(absorbed.x.abs() < 0.001);
    }

    proptest! {
        #[test]
        fn prop_separated_circles_never_overlap(
            r1 in 0.1f32..50.0,
            r2 in 0.1f32..50.0,
            gap in 0.01f32..100.0,
            angle in 0.0f32..std::f32::consts::TAU,
        ) {
            let dist = r1 + r2 + gap;
            let b = Vec2::new(angle.cos(), angle.sin()) * dist;
            prop_assert!(test_overlap(&circle(0.0, 0.0, r1), &circle(b.x, b.y, r2)).is_none());
        }

        #[test]
        fn prop_rect_mtv_separates(
            dx in -3.0f32..3.0,
            dy in -3.0f32..3.0,
        ) {
            let a = rect(dx, dy, 1.0, 1.5);
            let b = rect(0.0, 0.0, 2.0, 1.0);
            if let Some(hit) = test_overlap(&a, &b) {
                prop_assume!(hit.depth > 1e-3);
                let moved = rect(dx + hit.mtv.x * 1.01, dy + hit.mtv.y * 1.01, 1.0, 1.5);
                prop_assert!(test_overlap(&moved, &b).is_none());
            }
        }
    }
}
