//! Geometry helpers shared by perception and navigation code.
//!
//! World space is Y-up. Vision and obstruction tests that need a ground
//! plane use the XZ plane.

use glam::{Vec2, Vec3};

/// Length below which a direction vector is treated as zero.
pub const DIRECTION_EPSILON: f32 = 1e-6;

/// Angle in degrees between `forward` and the direction to `to_target`.
///
/// Returns 0 when either vector is degenerate, so a target standing exactly
/// on the observer counts as dead ahead.
#[must_use]
pub fn bearing_degrees(forward: Vec3, to_target: Vec3) -> f32 {
    if forward.length_squared() < DIRECTION_EPSILON || to_target.length_squared() < DIRECTION_EPSILON
    {
        return 0.0;
    }
    let cos = forward.normalize().dot(to_target.normalize()).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Projects a world position onto the XZ ground plane.
#[must_use]
pub fn ground(pos: Vec3) -> Vec2 {
    Vec2::new(pos.x, pos.z)
}

fn orientation(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Checks whether segments `a1-a2` and `b1-b2` intersect, touching included.
#[must_use]
pub fn segments_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(b1, b2, a1))
        || (d2 == 0.0 && on_segment(b1, b2, a2))
        || (d3 == 0.0 && on_segment(a1, a2, b1))
        || (d4 == 0.0 && on_segment(a1, a2, b2))
}
