//! Agent entity spawning.

use bevy::prelude::*;

use super::components::{AgentState, Enemy};
use super::data::Archetype;
use super::registry::AgentRegistry;

/// Register an agent and spawn the entity carrying it.
///
/// The entity has no collider or rigid body; callers wanting physics add
/// them (plus a [`Velocity`](bevy_rapier3d::prelude::Velocity)) afterwards.
pub fn spawn_agent(
    commands: &mut Commands,
    registry: &mut AgentRegistry,
    position: Vec3,
    archetype: Archetype,
    patrol_route: Option<Vec<Vec3>>,
) -> Entity {
    let id = registry.spawn(position, archetype, patrol_route);

    commands
        .spawn((
            Name::new(format!("{} {}", archetype, id)),
            Enemy(id),
            archetype,
            AgentState::default(),
            Transform::from_translation(position),
        ))
        .id()
}
