//! Player entity spawning.

use bevy::prelude::*;

use super::components::Player;

/// Spawn a bare player entity at `position`.
///
/// Only the transform matters to the agents; input, camera and body are up
/// to the host game.
pub fn spawn_player(commands: &mut Commands, position: Vec3) -> Entity {
    commands
        .spawn((Name::new("Player"), Player, Transform::from_translation(position)))
        .id()
}
