//! Player-related components.

use bevy::prelude::*;

/// Marker component for the player entity, the target every agent fights.
#[derive(Component, Debug, Default)]
pub struct Player;
