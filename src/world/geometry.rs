//! Obstacle spawning: the colliders that block sight and offer cover.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

/// Marks a collider the agents treat as an obstacle.
#[derive(Component, Debug, Default)]
pub struct ObstacleMarker;

/// Default pillar footprint (full width).
pub const PILLAR_SIZE: f32 = 1.0;

/// Spawn a square pillar standing on the ground at `position`.
pub fn spawn_pillar(commands: &mut Commands, position: Vec3, size: f32, height: f32) -> Entity {
    commands
        .spawn((
            Name::new("Pillar"),
            Transform::from_xyz(position.x, height / 2.0, position.z),
            Collider::cuboid(size / 2.0, height / 2.0, size / 2.0),
            ObstacleMarker,
        ))
        .id()
}

/// Spawn a wall segment between `start` and `end` on the ground plane.
pub fn spawn_wall(commands: &mut Commands, start: Vec3, end: Vec3, thickness: f32, height: f32) -> Entity {
    let span = Vec3::new(end.x - start.x, 0.0, end.z - start.z);
    let length = span.length();
    let center = (start + end) / 2.0;
    // Local X runs along the wall.
    let rotation = Quat::from_rotation_y(-span.z.atan2(span.x));

    commands
        .spawn((
            Name::new("Wall"),
            Transform::from_xyz(center.x, height / 2.0, center.z).with_rotation(rotation),
            Collider::cuboid(length / 2.0, height / 2.0, thickness / 2.0),
            ObstacleMarker,
        ))
        .id()
}
