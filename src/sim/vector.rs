//! 2D vector operations on top of `glam::Vec2`
//!
//! glam already covers add/sub/dot/length/distance. This adds the
//! operations physics and gameplay code lean on: the two normalize
//! variants, segment projection, and screen-space angles.

use glam::Vec2;

use crate::{cartesian_to_polar, normalize_angle, polar_to_cartesian};

/// All positions, velocities and geometry cross module boundaries as this.
pub type Vector = Vec2;

pub trait VectorExt: Sized {
    /// Scale each axis independently
    fn mult(self, sx: f32, sy: f32) -> Self;

    /// Scalar 2D cross product (z of the 3D cross)
    fn cross(self, other: Self) -> f32;

    /// Unit vector in the same direction.
    ///
    /// # Panics
    /// On the zero vector: callers use this where zero is a logic error.
    fn norm(self) -> Self;

    /// Unit vector in the same direction, or the zero vector unchanged
    fn norm2(self) -> Self;

    /// Rotate by `radians` (positive turns +x toward +y)
    fn rotated_by(self, radians: f32) -> Self;

    /// Signed angle from `self` to `other`, normalized to [-π, π).
    /// Positive is clockwise on screen (y grows downward).
    fn angle_toward(self, other: Self) -> f32;

    /// One of the two unit normals: the one with positive y, or +x for
    /// vertical input. Zero stays zero.
    fn unit_perpendicular(self) -> Self;

    /// Closest point to `self` on the segment `a..b`
    fn closest_point_on_segment(self, a: Self, b: Self) -> Self;

    /// Distance from `self` to the segment `a..b`
    fn distance_to_segment(self, a: Self, b: Self) -> f32;

    fn is_zero_vec(self) -> bool;
}

impl VectorExt for Vec2 {
    #[inline]
    fn mult(self, sx: f32, sy: f32) -> Self {
        Vec2::new(self.x * sx, self.y * sy)
    }

    #[inline]
    fn cross(self, other: Self) -> f32 {
        self.x * other.y - self.y * other.x
    }

    fn norm(self) -> Self {
        assert!(!self.is_zero_vec(), "can't normalize the zero vector");
        unit(self)
    }

    fn norm2(self) -> Self {
        if self.is_zero_vec() {
            return self;
        }
        unit(self)
    }

    fn rotated_by(self, radians: f32) -> Self {
        let (mag, angle) = cartesian_to_polar(self);
        polar_to_cartesian(mag, angle + radians)
    }

    fn angle_toward(self, other: Self) -> f32 {
        normalize_angle(other.y.atan2(other.x) - self.y.atan2(self.x))
    }

    fn unit_perpendicular(self) -> Self {
        if self.is_zero_vec() {
            return Vec2::ZERO;
        }
        if self.x == 0.0 {
            return Vec2::X;
        }
        let n = Vec2::new(-self.y, self.x).norm();
        if n.y < 0.0 { -n } else { n }
    }

    fn closest_point_on_segment(self, a: Self, b: Self) -> Self {
        let ab = b - a;
        let length2 = ab.length_squared();
        if length2 == 0.0 {
            return a;
        }
        let t = ((self - a).dot(ab) / length2).clamp(0.0, 1.0);
        a + ab * t
    }

    fn distance_to_segment(self, a: Self, b: Self) -> f32 {
        self.distance(self.closest_point_on_segment(a, b))
    }

    #[inline]
    fn is_zero_vec(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// Divide out the largest component first so subnormal input does not
/// underflow `length()` to zero. `v` must be nonzero.
fn unit(v: Vec2) -> Vec2 {
    let scaled = v / v.abs().max_element();
    scaled / scaled.length()
}
