//! Core plugin that registers the cross-module events.

use bevy::prelude::*;

use super::events::*;

/// Core plugin - must be added first as other plugins depend on it.
pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DamageAgentEvent>()
            .add_event::<AttackIntentEvent>()
            .add_event::<AgentDiedEvent>()
            .add_event::<AgentStateChangedEvent>();
    }
}
