//! Enemy plugin - registers the agent registry and its systems.

use bevy::prelude::*;

use super::registry::AgentRegistry;
use super::systems::{apply_agent_damage, despawn_removed_agents, load_agent_data, tick_agents};

/// Enemy plugin - loads agent data before startup and ticks agents every frame.
pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AgentRegistry>()
            .add_systems(PreStartup, load_agent_data)
            // Damage first: an agent killed this frame must not attack
            .add_systems(
                Update,
                (apply_agent_damage, tick_agents, despawn_removed_agents).chain(),
            );
    }
}
