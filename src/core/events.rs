//! Events exchanged between the agent systems and the rest of the game.
//!
//! Damage comes in as [`DamageAgentEvent`]; everything else goes out so that
//! projectile, animation and audio systems can react without touching the
//! agent registry.

use bevy::prelude::*;

use crate::enemies::{AgentState, AttackIntent};

/// Damage dealt to an agent entity.
#[derive(Event, Debug, Clone, Copy)]
pub struct DamageAgentEvent {
    /// Entity carrying the [`Enemy`](crate::enemies::Enemy) link
    pub target: Entity,
    /// Negative amounts are treated as zero
    pub amount: f32,
}

/// An agent released an attack at the target.
///
/// Hit resolution (accuracy roll, projectile travel) belongs to the listener.
#[derive(Event, Debug, Clone, Copy)]
pub struct AttackIntentEvent {
    pub attacker: Entity,
    pub intent: AttackIntent,
}

/// Sent once when an agent dies.
///
/// The entity stays around for the despawn grace period, so death
/// animations can play.
#[derive(Event, Debug, Clone, Copy)]
pub struct AgentDiedEvent {
    pub entity: Entity,
}

/// An agent's behavioural state changed.
#[derive(Event, Debug, Clone, Copy)]
pub struct AgentStateChangedEvent {
    pub entity: Entity,
    pub from: AgentState,
    pub to: AgentState,
}
