//! Vector and angle helpers shared by the AI modules.
//!
//! Agents move on the ground plane, so most helpers here work on the
//! horizontal (XZ) projection of a vector. Yaw follows the convention
//! `Quat::from_rotation_y(yaw) * Vec3::Z == direction`, i.e. yaw 0 faces +Z.

use std::f32::consts::{PI, TAU};

use bevy::prelude::*;

/// Below this length a direction is treated as undefined.
pub const DIRECTION_EPSILON: f32 = 1e-4;

/// Drop the vertical component of a vector.
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Distance between two points ignoring height.
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    horizontal(b - a).length()
}

/// Unit direction from `from` to `to` on the ground plane, or zero if the
/// points coincide horizontally.
pub fn direction_to(from: Vec3, to: Vec3) -> Vec3 {
    let offset = horizontal(to - from);
    if offset.length_squared() < DIRECTION_EPSILON * DIRECTION_EPSILON {
        Vec3::ZERO
    } else {
        offset.normalize()
    }
}

/// Yaw angle (radians) that faces along `direction`, if it has a horizontal component.
pub fn yaw_of(direction: Vec3) -> Option<f32> {
    let flat = horizontal(direction);
    if flat.length_squared() < DIRECTION_EPSILON * DIRECTION_EPSILON {
        return None;
    }
    Some(flat.x.atan2(flat.z))
}

/// Unit vector on the ground plane for a yaw angle.
pub fn yaw_direction(yaw: f32) -> Vec3 {
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

/// Rotate a vector about +Y.
pub fn rotate_y(v: Vec3, angle: f32) -> Vec3 {
    Quat::from_rotation_y(angle) * v
}

/// Wrap an angle into `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Signed difference `to - from` along the shortest arc.
pub fn shortest_angle_delta(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}

/// Interpolate between two angles along the shortest arc.
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    wrap_angle(from + shortest_angle_delta(from, to) * t.clamp(0.0, 1.0))
}

/// Rate at which a distance shrank between two samples (positive = closing).
///
/// Returns zero for a non-positive `delta`.
pub fn closing_speed(previous: f32, current: f32, delta: f32) -> f32 {
    if delta <= 0.0 {
        return 0.0;
    }
    (previous - current) / delta
}
