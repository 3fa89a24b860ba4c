//! Enemies module - combat agents, their AI and the Bevy glue driving them.

mod ai;
mod combat;
mod components;
mod cover;
pub mod data;
mod error;
mod movement;
mod perception;
mod plugin;
mod registry;
mod spawning;
mod systems;

pub use ai::{desired_state, is_target_approaching, perceive, think, Senses};
pub use combat::{maybe_attack, take_damage, update_attack, AttackOutcome};
pub use components::*;
pub use cover::{find_cover, find_cover_point, CoverPoint, CoverSearch};
pub use data::{AiTuning, Archetype, ArchetypeStats, ArchetypeTable};
pub use error::{AiError, DataLoadError};
pub use movement::{engage_distance, plan_movement, target_position, MovementPlan};
pub use perception::{can_see_target, Obstacle};
pub use plugin::EnemyPlugin;
pub use registry::{AgentRegistry, AgentUpdate, TickReport};
pub use spawning::spawn_agent;
pub use systems::{apply_agent_damage, despawn_removed_agents, load_agent_data, tick_agents};
