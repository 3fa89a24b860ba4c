//! Line-of-sight queries against static obstacle colliders.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use std::fmt;

use crate::core::geometry::DIRECTION_EPSILON;

/// A static shape that blocks sight and offers cover.
#[derive(Clone)]
pub struct Obstacle {
    pub position: Vec3,
    pub rotation: Quat,
    pub collider: Collider,
}

impl Obstacle {
    pub fn new(position: Vec3, collider: Collider) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            collider,
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Axis-aligned box with the given half extents.
    pub fn cuboid(position: Vec3, half_extents: Vec3) -> Self {
        Self::new(
            position,
            Collider::cuboid(half_extents.x, half_extents.y, half_extents.z),
        )
    }

    /// Distance along the ray to the first surface hit, if within `max_distance`.
    ///
    /// `direction` must be normalized.
    pub fn ray_hit_distance(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        self.collider
            .cast_ray(self.position, self.rotation, origin, direction, max_distance, true)
    }
}

impl fmt::Debug for Obstacle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Obstacle")
            .field("position", &self.position)
            .field("rotation", &self.rotation)
            .finish_non_exhaustive()
    }
}

/// Whether an unobstructed ray connects the agent to the target.
///
/// A hit strictly closer than the target blocks sight. With no obstacles the
/// target is always visible.
pub fn can_see_target(agent_pos: Vec3, target_pos: Vec3, obstacles: &[Obstacle]) -> bool {
    let offset = target_pos - agent_pos;
    let distance = offset.length();
    if distance < DIRECTION_EPSILON {
        return true;
    }
    let direction = offset / distance;

    !obstacles.iter().any(|obstacle| {
        obstacle
            .ray_hit_distance(agent_pos, direction, distance)
            .is_some_and(|hit| hit < distance)
    })
}
