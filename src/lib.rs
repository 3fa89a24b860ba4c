//! Combat AI - per-tick enemy behaviour for a Bevy + Rapier game.
//!
//! Each enemy is an agent in the [`enemies::AgentRegistry`]. Every tick an
//! agent looks for the player (ray casts against obstacle colliders), picks
//! a behavioural state through a debounced state machine, plans where to
//! move, and decides whether to attack.
//!
//! # Architecture
//!
//! - **Core**: Cross-module events, ground-plane geometry, smoothing
//! - **Enemies**: Agents, perception, cover search, state machine, movement,
//!   combat and the registry, plus the systems driving them
//! - **Player**: The target entity
//! - **World**: Obstacle colliders
//!
//! The registry is plain Rust and can be driven without an `App`; the
//! plugins only mirror transforms in and velocities, rotations and events
//! out.

pub mod core;
pub mod enemies;
pub mod player;
pub mod world;

use bevy::prelude::*;

/// Adds every combat AI plugin.
pub struct CombatAiPlugin;

impl Plugin for CombatAiPlugin {
    fn build(&self, app: &mut App) {
        app
            // Events (must be first)
            .add_plugins(core::CorePlugin)
            // Agents
            .add_plugins(enemies::EnemyPlugin);
    }
}
